//! Append-only interaction history.
//!
//! Every record type keeps an ordered list of logged interactions. Entries are
//! never mutated or removed once written. Insertion order is the only order.
//! Plain orders log [`HistoryEntry`] values; the fake-order and high-risk
//! variants log [`Message`] values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantNames};
use uuid::Uuid;

// ─── Entry kinds ─────────────────────────────────────────────────────────────

/// Well-known values of [`HistoryEntry::kind`]. The field itself is free text.
pub mod kinds {
  pub const RESPONSE: &str = "Response";
  pub const TAG: &str = "Tag";
  pub const REMINDER_SENT: &str = "Reminder Sent";
  pub const CUSTOMER_CALLED: &str = "Customer Called";
  pub const MARKED_RESOLVED: &str = "Marked as Resolved";
  /// Only ever synthesised as the first step of a timeline; never stored.
  pub const ORDER_PLACED: &str = "Order Placed";
}

// ─── Order history ───────────────────────────────────────────────────────────

/// One logged interaction against an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
  #[serde(rename = "type")]
  pub kind:      String,
  pub content:   String,
  pub timestamp: DateTime<Utc>,
  /// Per-entry delivery or interaction status, e.g. `sent`, `responded`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status:    Option<String>,
}

impl HistoryEntry {
  pub fn new(
    kind: impl Into<String>,
    content: impl Into<String>,
    timestamp: DateTime<Utc>,
  ) -> Self {
    Self {
      kind: kind.into(),
      content: content.into(),
      timestamp,
      status: None,
    }
  }

  pub fn with_status(mut self, status: impl Into<String>) -> Self {
    self.status = Some(status.into());
    self
  }

  /// Case-insensitive substring match against `content`.
  pub fn content_mentions(&self, needle: &str) -> bool {
    self.content.to_lowercase().contains(needle)
  }
}

// ─── Message history ─────────────────────────────────────────────────────────

/// Who authored a [`Message`].
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
  Display, EnumString, AsRefStr, VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Sender {
  System,
  #[default]
  User,
  Customer,
}

/// One logged message against a fake-order or high-risk record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  pub id:        String,
  pub text:      String,
  pub sender:    Sender,
  pub timestamp: DateTime<Utc>,
}

impl Message {
  /// Build a message with a fresh id and a server-assigned timestamp.
  pub fn new(text: impl Into<String>, sender: Sender) -> Self {
    Self {
      id: format!("msg-{}", Uuid::new_v4().simple()),
      text: text.into(),
      sender,
      timestamp: Utc::now(),
    }
  }
}

// ─── Shared traits ───────────────────────────────────────────────────────────

/// An entry that records when it happened.
pub trait Timestamped {
  fn recorded_at(&self) -> DateTime<Utc>;
}

impl Timestamped for HistoryEntry {
  fn recorded_at(&self) -> DateTime<Utc> { self.timestamp }
}

impl Timestamped for Message {
  fn recorded_at(&self) -> DateTime<Utc> { self.timestamp }
}

/// A record carrying an append-only history.
pub trait HistoryBearing {
  type Entry: Timestamped;

  /// Entries in insertion order.
  fn history(&self) -> &[Self::Entry];

  /// Timestamp of the most recent entry, if any.
  fn last_activity(&self) -> Option<DateTime<Utc>> {
    self.history().iter().map(Timestamped::recorded_at).max()
  }
}

// ─── Atomic change set ───────────────────────────────────────────────────────

/// A status transition and/or history append applied to one record in a
/// single write. An empty change is a no-op that still reports whether the
/// record exists.
#[derive(Debug, Clone)]
pub struct RecordChange<S, E> {
  pub status: Option<S>,
  pub append: Vec<E>,
}

impl<S, E> Default for RecordChange<S, E> {
  fn default() -> Self {
    Self {
      status: None,
      append: Vec::new(),
    }
  }
}

impl<S, E> RecordChange<S, E> {
  pub fn status(status: S) -> Self {
    Self {
      status: Some(status),
      append: Vec::new(),
    }
  }

  pub fn append(entry: E) -> Self {
    Self {
      status: None,
      append: vec![entry],
    }
  }

  pub fn and_append(mut self, entry: E) -> Self {
    self.append.push(entry);
    self
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  struct Log(Vec<HistoryEntry>);

  impl HistoryBearing for Log {
    type Entry = HistoryEntry;
    fn history(&self) -> &[HistoryEntry] { &self.0 }
  }

  #[test]
  fn last_activity_is_latest_not_last_inserted() {
    let early = Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2025, 5, 21, 9, 0, 0).unwrap();
    let log = Log(vec![
      HistoryEntry::new("WhatsApp Message", "hi", late),
      HistoryEntry::new(kinds::RESPONSE, "YES", early),
    ]);
    assert_eq!(log.last_activity(), Some(late));
    assert_eq!(Log(vec![]).last_activity(), None);
  }

  #[test]
  fn entry_serialises_kind_as_type() {
    let ts = Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap();
    let json = serde_json::to_value(HistoryEntry::new(kinds::TAG, "Confirmed", ts)).unwrap();
    assert_eq!(json["type"], "Tag");
    assert!(json.get("status").is_none());
  }

  #[test]
  fn content_match_ignores_case() {
    let ts = Utc::now();
    let entry = HistoryEntry::new("Note", "Sent a REMINDER by sms", ts);
    assert!(entry.content_mentions("reminder"));
    assert!(!entry.content_mentions("call"));
  }

  #[test]
  fn message_ids_are_unique() {
    let a = Message::new("one", Sender::System);
    let b = Message::new("two", Sender::System);
    assert_ne!(a.id, b.id);
    assert!(a.id.starts_with("msg-"));
  }
}
