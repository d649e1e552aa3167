//! Reporting views over plain orders.
//!
//! Every function here takes an already-fetched slice of orders plus `now`
//! and is free of storage access. The store decides *which* orders to scan;
//! these decide what the dashboard sees.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::{
  contact::{
    self, ContactStatus, FlowStage, TimelineStep, determine_customer_status, is_call,
    is_reminder, is_resolution, whole_days_between,
  },
  format,
  history::{HistoryEntry, kinds},
  order::Order,
  status::OrderStatus,
};

// ─── Time buckets ────────────────────────────────────────────────────────────

/// Day-aligned boundaries for "today / this week / this month" counters.
/// `today` is midnight UTC of `now`; the week and month boundaries are 7 and
/// 30 days before that.
#[derive(Debug, Clone, Copy)]
pub struct TimeBuckets {
  pub today:     DateTime<Utc>,
  pub week_ago:  DateTime<Utc>,
  pub month_ago: DateTime<Utc>,
}

impl TimeBuckets {
  pub fn at(now: DateTime<Utc>) -> Self {
    let today = now
      .date_naive()
      .and_hms_opt(0, 0, 0)
      .map(|midnight| midnight.and_utc())
      .unwrap_or(now);
    Self {
      today,
      week_ago: today - Duration::days(7),
      month_ago: today - Duration::days(30),
    }
  }
}

/// Counts of timestamps falling on or after each bucket boundary. Buckets
/// nest, so an entry from today also counts towards the week and the month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BucketCounts {
  pub today:      usize,
  pub this_week:  usize,
  pub this_month: usize,
}

impl BucketCounts {
  fn record(&mut self, at: DateTime<Utc>, buckets: &TimeBuckets) {
    if at >= buckets.today {
      self.today += 1;
    }
    if at >= buckets.week_ago {
      self.this_week += 1;
    }
    if at >= buckets.month_ago {
      self.this_month += 1;
    }
  }
}

// ─── Order stats ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
  pub confirmed:   usize,
  pub pending:     usize,
  pub unconfirmed: usize,
  pub total:       usize,
}

pub fn order_stats(orders: &[Order]) -> OrderStats {
  orders.iter().fold(OrderStats::default(), |mut stats, order| {
    match order.status {
      OrderStatus::Confirmed => stats.confirmed += 1,
      OrderStatus::Pending => stats.pending += 1,
      OrderStatus::Unconfirmed => stats.unconfirmed += 1,
    }
    stats.total += 1;
    stats
  })
}

// ─── Unresponsive customers ──────────────────────────────────────────────────

/// One row of the unresponsive-customers grid.
#[derive(Debug, Clone, Serialize)]
pub struct UnresponsiveCustomer {
  pub id:               String,
  pub customer_id:      String,
  pub name:             String,
  pub email:            String,
  pub phone:            String,
  pub address:          String,
  pub order_number:     String,
  pub order_date:       String,
  pub order_total:      f64,
  pub status:           ContactStatus,
  pub last_contact:     String,
  pub flow_stage:       FlowStage,
  pub actions:          Vec<TimelineStep>,
  pub days_since_order: i64,
}

impl UnresponsiveCustomer {
  pub fn project(order: &Order, now: DateTime<Utc>) -> Self {
    let status = determine_customer_status(order, now);
    Self {
      id: order.customer_id(),
      customer_id: order.order_id.clone(),
      name: order.customer_name.clone(),
      email: order.customer_email.clone(),
      phone: order.customer_phone.clone(),
      address: order.customer_address.clone(),
      order_number: order.order_id.clone(),
      order_date: format::date(order.created_date),
      order_total: order.total_price,
      status,
      last_contact: format::date_clock(contact::last_contact(order)),
      flow_stage: status.into(),
      actions: contact::customer_timeline(order),
      days_since_order: contact::days_since_order(order, now),
    }
  }
}

/// Project awaiting-confirmation orders into grid rows, keeping only those
/// whose derived status matches `filter` when one is given. Input order is
/// preserved; confirmed orders are skipped.
pub fn unresponsive_customers(
  orders: &[Order],
  filter: Option<ContactStatus>,
  now: DateTime<Utc>,
) -> Vec<UnresponsiveCustomer> {
  orders
    .iter()
    .filter(|o| o.status != OrderStatus::Confirmed)
    .filter(|o| filter.is_none_or(|want| determine_customer_status(o, now) == want))
    .map(|o| UnresponsiveCustomer::project(o, now))
    .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnresponsiveStats {
  pub waiting:         usize,
  pub reminder_sent:   usize,
  pub no_response:     usize,
  pub tagged:          usize,
  pub manual_followup: usize,
  pub total:           usize,
}

pub fn unresponsive_stats(orders: &[Order], now: DateTime<Utc>) -> UnresponsiveStats {
  let mut stats = UnresponsiveStats::default();
  for order in orders.iter().filter(|o| o.status != OrderStatus::Confirmed) {
    let slot = match determine_customer_status(order, now) {
      ContactStatus::Waiting => &mut stats.waiting,
      ContactStatus::ReminderSent => &mut stats.reminder_sent,
      ContactStatus::NoResponse => &mut stats.no_response,
      ContactStatus::Tagged => &mut stats.tagged,
      ContactStatus::ManualFollowup => &mut stats.manual_followup,
    };
    *slot += 1;
    stats.total += 1;
  }
  stats
}

// ─── Reminder history ────────────────────────────────────────────────────────

/// Reminder-like entries also match on a `type` mentioning "reminder", so
/// free-form types such as `SMS Reminder` are listed too.
fn is_listed_reminder(entry: &HistoryEntry) -> bool {
  is_reminder(entry) || entry.kind.to_lowercase().contains("reminder")
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderRecord {
  pub order_id:            String,
  pub customer_name:       String,
  pub customer_email:      String,
  pub customer_phone:      String,
  pub reminder_type:       String,
  pub reminder_content:    String,
  pub sent_date:           String,
  pub sent_time:           String,
  pub status:              String,
  pub order_total:         f64,
  pub days_since_reminder: i64,
  #[serde(skip)]
  sent_at:                 DateTime<Utc>,
}

/// Every reminder entry across `orders`, flattened and sorted most recent
/// first.
pub fn reminder_history(orders: &[Order], now: DateTime<Utc>) -> Vec<ReminderRecord> {
  let mut rows: Vec<ReminderRecord> = orders
    .iter()
    .flat_map(|order| {
      order
        .confirmation_history
        .iter()
        .filter(|e| is_listed_reminder(e))
        .map(move |entry| ReminderRecord {
          order_id:            order.order_id.clone(),
          customer_name:       order.customer_name.clone(),
          customer_email:      order.customer_email.clone(),
          customer_phone:      order.customer_phone.clone(),
          reminder_type:       entry.kind.clone(),
          reminder_content:    entry.content.clone(),
          sent_date:           format::date(entry.timestamp),
          sent_time:           format::clock(entry.timestamp),
          status:              entry.status.clone().unwrap_or_else(|| "sent".to_owned()),
          order_total:         order.total_price,
          days_since_reminder: whole_days_between(entry.timestamp, now),
          sent_at:             entry.timestamp,
        })
    })
    .collect();
  rows.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
  rows
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderStats {
  pub total_reminders: usize,
  #[serde(flatten)]
  pub buckets:         BucketCounts,
}

pub fn reminder_stats(orders: &[Order], now: DateTime<Utc>) -> ReminderStats {
  let buckets = TimeBuckets::at(now);
  let mut stats = ReminderStats::default();
  for entry in orders.iter().flat_map(|o| &o.confirmation_history).filter(|e| is_reminder(e)) {
    stats.total_reminders += 1;
    stats.buckets.record(entry.timestamp, &buckets);
  }
  stats
}

// ─── Resolved customers ──────────────────────────────────────────────────────

const CUSTOMER_CONFIRMED: &str = "Customer Confirmed";

/// The entry that resolved `order`, if one can be identified: the first
/// explicit resolution entry, else, for a confirmed order that needed
/// chasing, the last `Response` saying "yes".
fn resolution_entry(order: &Order) -> Option<&HistoryEntry> {
  let history = &order.confirmation_history;
  if let Some(entry) = history.iter().find(|e| is_resolution(e)) {
    return Some(entry);
  }
  let chased = history.iter().any(|e| is_reminder(e) || is_call(e));
  if order.status == OrderStatus::Confirmed && chased {
    return history
      .iter()
      .rev()
      .find(|e| e.kind == kinds::RESPONSE && e.content_mentions("yes"));
  }
  None
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedCustomer {
  pub order_id:          String,
  pub customer_name:     String,
  pub customer_email:    String,
  pub customer_phone:    String,
  pub customer_address:  String,
  pub order_total:       f64,
  pub order_date:        String,
  pub resolved_date:     String,
  pub resolved_time:     String,
  pub resolution_method: String,
  pub resolution_note:   String,
  pub days_to_resolve:   i64,
  pub status:            &'static str,
  #[serde(skip)]
  resolved_at:           DateTime<Utc>,
}

/// Orders that are confirmed or carry a resolution entry, most recently
/// resolved first. Orders without an identifiable resolution entry fall back
/// to their creation time.
pub fn resolved_customers(orders: &[Order]) -> Vec<ResolvedCustomer> {
  let mut rows: Vec<ResolvedCustomer> = orders
    .iter()
    .filter_map(|order| {
      let entry = resolution_entry(order);
      if entry.is_none() && order.status != OrderStatus::Confirmed {
        return None;
      }
      let resolved_at = entry.map_or(order.created_date, |e| e.timestamp);
      Some(ResolvedCustomer {
        order_id:          order.order_id.clone(),
        customer_name:     order.customer_name.clone(),
        customer_email:    order.customer_email.clone(),
        customer_phone:    order.customer_phone.clone(),
        customer_address:  order.customer_address.clone(),
        order_total:       order.total_price,
        order_date:        format::date(order.created_date),
        resolved_date:     format::date(resolved_at),
        resolved_time:     entry.map(|e| format::clock(e.timestamp)).unwrap_or_default(),
        resolution_method: entry.map_or_else(|| CUSTOMER_CONFIRMED.to_owned(), |e| e.kind.clone()),
        resolution_note:   entry.map_or_else(
          || "Customer confirmed order".to_owned(),
          |e| e.content.clone(),
        ),
        days_to_resolve:   entry.map_or(0, |e| whole_days_between(order.created_date, e.timestamp)),
        status:            "resolved",
        resolved_at,
      })
    })
    .collect();
  rows.sort_by(|a, b| b.resolved_at.cmp(&a.resolved_at));
  rows
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedStats {
  pub total_resolved: usize,
  #[serde(flatten)]
  pub buckets:        BucketCounts,
}

/// Bucket each resolved order by its first `Marked as Resolved` entry, or,
/// for a confirmed order, its last `Response` entry. Orders with neither are
/// counted in the total only.
pub fn resolved_stats(orders: &[Order], now: DateTime<Utc>) -> ResolvedStats {
  let buckets = TimeBuckets::at(now);
  let mut stats = ResolvedStats::default();

  for order in orders {
    let history = &order.confirmation_history;
    let marked = history.iter().find(|e| e.kind == kinds::MARKED_RESOLVED);
    let confirmed = order.status == OrderStatus::Confirmed;
    if marked.is_none() && !confirmed {
      continue;
    }
    stats.total_resolved += 1;

    let resolved_at = marked
      .or_else(|| {
        confirmed
          .then(|| history.iter().rev().find(|e| e.kind == kinds::RESPONSE))
          .flatten()
      })
      .map(|e| e.timestamp);
    if let Some(at) = resolved_at {
      stats.buckets.record(at, &buckets);
    }
  }
  stats
}
