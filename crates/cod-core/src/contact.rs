//! Derived contact status.
//!
//! The follow-up state of a customer is never stored. It is recomputed on
//! every read from the order's status, its age, and its history, so it cannot
//! drift from those inputs. Everything here is a pure function of an
//! [`Order`] snapshot and a caller-supplied `now`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantNames};

use crate::{
  format,
  history::{HistoryBearing, HistoryEntry, kinds},
  order::Order,
  status::OrderStatus,
};

// ─── Labels ──────────────────────────────────────────────────────────────────

/// The derived contact-state label used for dashboard grouping.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
  Display, EnumString, AsRefStr, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContactStatus {
  Waiting,
  ReminderSent,
  NoResponse,
  Tagged,
  ManualFollowup,
}

/// The UI flow stage a [`ContactStatus`] maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStage {
  Confirmation,
  Reminder,
  NoResponse,
  CallTagged,
  ManualFollowup,
}

impl From<ContactStatus> for FlowStage {
  fn from(status: ContactStatus) -> Self {
    match status {
      ContactStatus::Waiting => Self::Confirmation,
      ContactStatus::ReminderSent => Self::Reminder,
      ContactStatus::NoResponse => Self::NoResponse,
      ContactStatus::Tagged => Self::CallTagged,
      ContactStatus::ManualFollowup => Self::ManualFollowup,
    }
  }
}

// ─── History heuristics ──────────────────────────────────────────────────────

/// A reminder was sent: the entry is typed `Reminder Sent` or mentions
/// "reminder" in its content.
pub fn is_reminder(entry: &HistoryEntry) -> bool {
  entry.kind == kinds::REMINDER_SENT || entry.content_mentions("reminder")
}

/// A call was attempted: the entry is typed `Customer Called` or mentions
/// "call" in its content.
pub fn is_call(entry: &HistoryEntry) -> bool {
  entry.kind == kinds::CUSTOMER_CALLED || entry.content_mentions("call")
}

/// The entry marks the customer as resolved.
pub fn is_resolution(entry: &HistoryEntry) -> bool {
  entry.kind == kinds::MARKED_RESOLVED || entry.content_mentions("marked as resolved")
}

// ─── Derivation ──────────────────────────────────────────────────────────────

const SECONDS_PER_DAY: i64 = 86_400;

/// Whole days between `from` and `now`, floored. Negative when `from` lies in
/// the future.
pub fn whole_days_between(from: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  (now - from).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Whole days since the order was placed, floored.
pub fn days_since_order(order: &Order, now: DateTime<Utc>) -> i64 {
  whole_days_between(order.created_date, now)
}

/// Map an order onto its contact status. First matching rule wins:
///
/// | status | condition | result |
/// |---|---|---|
/// | unconfirmed | a call was attempted | `manual_followup` |
/// | unconfirmed | ≥ 2 days old | `tagged` |
/// | unconfirmed | otherwise | `no_response` |
/// | pending | ≥ 3 days old | `manual_followup` |
/// | pending | ≥ 2 days old | `tagged` |
/// | pending | ≥ 1 day old, or a reminder was sent | `reminder_sent` |
/// | pending | otherwise | `waiting` |
/// | confirmed | — | `waiting` |
///
/// An order dated in the future has a negative age, so it falls through to
/// `no_response` or `waiting`.
pub fn determine_customer_status(order: &Order, now: DateTime<Utc>) -> ContactStatus {
  let days = days_since_order(order, now);
  let history = order.history();

  match order.status {
    OrderStatus::Unconfirmed => {
      if history.iter().any(is_call) {
        ContactStatus::ManualFollowup
      } else if days >= 2 {
        ContactStatus::Tagged
      } else {
        ContactStatus::NoResponse
      }
    }
    OrderStatus::Pending => {
      if days >= 3 {
        ContactStatus::ManualFollowup
      } else if days >= 2 {
        ContactStatus::Tagged
      } else if days >= 1 || history.iter().any(is_reminder) {
        ContactStatus::ReminderSent
      } else {
        ContactStatus::Waiting
      }
    }
    OrderStatus::Confirmed => ContactStatus::Waiting,
  }
}

// ─── Timeline ────────────────────────────────────────────────────────────────

/// One step of the customer timeline shown in the unresponsive grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineStep {
  #[serde(rename = "type")]
  pub kind:      String,
  pub timestamp: String,
  pub status:    String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub note:      Option<String>,
}

/// A synthetic `Order Placed` step followed by every history entry in
/// insertion order.
pub fn customer_timeline(order: &Order) -> Vec<TimelineStep> {
  let placed = TimelineStep {
    kind:      kinds::ORDER_PLACED.to_owned(),
    timestamp: format::date_clock(order.created_date),
    status:    "completed".to_owned(),
    note:      None,
  };

  std::iter::once(placed)
    .chain(order.history().iter().map(|entry| TimelineStep {
      kind:      entry.kind.clone(),
      timestamp: format::date_clock(entry.timestamp),
      status:    entry.status.clone().unwrap_or_else(|| "completed".to_owned()),
      note:      (!entry.content.is_empty()).then(|| entry.content.clone()),
    }))
    .collect()
}

/// When the customer was last contacted: the latest history timestamp, or the
/// order's creation time when there is no history.
pub fn last_contact(order: &Order) -> DateTime<Utc> {
  order.last_activity().unwrap_or(order.created_date)
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::order::tests::order_aged;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() }

  fn entry(kind: &str, content: &str) -> HistoryEntry {
    HistoryEntry::new(kind, content, now() - Duration::hours(1))
  }

  #[test]
  fn fresh_pending_order_without_history_is_waiting() {
    let order = order_aged("ORD-1", OrderStatus::Pending, now(), Duration::hours(5));
    assert_eq!(determine_customer_status(&order, now()), ContactStatus::Waiting);
    let stage = FlowStage::from(determine_customer_status(&order, now()));
    assert_eq!(stage, FlowStage::Confirmation);
  }

  #[test]
  fn pending_reminder_promotes_same_day_order() {
    let mut order = order_aged("ORD-1", OrderStatus::Pending, now(), Duration::hours(5));
    order.confirmation_history.push(entry("WhatsApp Message", "Friendly Reminder: please confirm"));
    assert_eq!(determine_customer_status(&order, now()), ContactStatus::ReminderSent);
  }

  #[test]
  fn pending_ages_through_each_band() {
    let cases = [
      (Duration::hours(23), ContactStatus::Waiting),
      (Duration::hours(24), ContactStatus::ReminderSent),
      (Duration::hours(47), ContactStatus::ReminderSent),
      (Duration::days(2), ContactStatus::Tagged),
      (Duration::days(3), ContactStatus::ManualFollowup),
      (Duration::days(30), ContactStatus::ManualFollowup),
    ];
    for (age, expected) in cases {
      let order = order_aged("ORD-1", OrderStatus::Pending, now(), age);
      assert_eq!(determine_customer_status(&order, now()), expected, "age {age}");
    }
  }

  #[test]
  fn pending_two_days_stays_tagged_after_reminder() {
    let mut order = order_aged("ORD-1", OrderStatus::Pending, now(), Duration::days(2));
    assert_eq!(determine_customer_status(&order, now()), ContactStatus::Tagged);

    order.confirmation_history.push(entry(kinds::REMINDER_SENT, "Follow-up sent"));
    assert_eq!(determine_customer_status(&order, now()), ContactStatus::Tagged);
  }

  #[test]
  fn unconfirmed_with_call_is_manual_followup_at_any_age() {
    for age in [Duration::zero(), Duration::days(1), Duration::days(10)] {
      let mut order = order_aged("ORD-1", OrderStatus::Unconfirmed, now(), age);
      order.confirmation_history.push(entry("Note", "Tried to CALL the customer"));
      assert_eq!(determine_customer_status(&order, now()), ContactStatus::ManualFollowup);
    }
  }

  #[test]
  fn unconfirmed_without_call() {
    let young = order_aged("ORD-1", OrderStatus::Unconfirmed, now(), Duration::hours(30));
    assert_eq!(determine_customer_status(&young, now()), ContactStatus::NoResponse);

    let old = order_aged("ORD-1", OrderStatus::Unconfirmed, now(), Duration::days(2));
    assert_eq!(determine_customer_status(&old, now()), ContactStatus::Tagged);
    let stage = FlowStage::from(determine_customer_status(&old, now()));
    assert_eq!(stage, FlowStage::CallTagged);
  }

  #[test]
  fn confirmed_is_always_waiting() {
    let mut order = order_aged("ORD-1", OrderStatus::Confirmed, now(), Duration::days(9));
    order.confirmation_history.push(entry(kinds::CUSTOMER_CALLED, "called"));
    assert_eq!(determine_customer_status(&order, now()), ContactStatus::Waiting);
  }

  #[test]
  fn future_dated_orders_fall_through() {
    let future = -Duration::hours(6);
    let pending = order_aged("ORD-1", OrderStatus::Pending, now(), future);
    assert_eq!(days_since_order(&pending, now()), -1);
    assert_eq!(determine_customer_status(&pending, now()), ContactStatus::Waiting);

    let unconfirmed = order_aged("ORD-2", OrderStatus::Unconfirmed, now(), -Duration::days(3));
    assert_eq!(determine_customer_status(&unconfirmed, now()), ContactStatus::NoResponse);
  }

  #[test]
  fn day_count_floors() {
    let start = now();
    assert_eq!(whole_days_between(start, start + Duration::hours(47)), 1);
    assert_eq!(whole_days_between(start, start + Duration::hours(48)), 2);
    assert_eq!(whole_days_between(start, start - Duration::seconds(1)), -1);
  }

  #[test]
  fn timeline_seeds_order_placed() {
    let mut order = order_aged("ORD-1", OrderStatus::Pending, now(), Duration::days(1));
    order.confirmation_history.push(entry("WhatsApp Message", "Please confirm").with_status("sent"));
    order.confirmation_history.push(entry(kinds::TAG, ""));

    let steps = customer_timeline(&order);
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[0].kind, kinds::ORDER_PLACED);
    assert_eq!(steps[0].timestamp, "2025-05-31 12:00 PM");
    assert_eq!(steps[1].status, "sent");
    assert_eq!(steps[1].note.as_deref(), Some("Please confirm"));
    assert_eq!(steps[2].status, "completed");
    assert_eq!(steps[2].note, None);
  }

  #[test]
  fn last_contact_falls_back_to_creation() {
    let mut order = order_aged("ORD-1", OrderStatus::Pending, now(), Duration::days(1));
    assert_eq!(last_contact(&order), order.created_date);
    order.confirmation_history.push(entry("WhatsApp Message", "hi"));
    assert_eq!(last_contact(&order), now() - Duration::hours(1));
  }
}
