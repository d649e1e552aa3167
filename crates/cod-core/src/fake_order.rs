//! Orders under review as possibly fake.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  format,
  history::{HistoryBearing, Message},
  status::{FakeOrderStatus, StatusCounts},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FakeOrderRecord {
  pub order_id:              String,
  pub customer:              String,
  pub phone:                 String,
  pub address:               String,
  pub amount:                f64,
  pub status:                FakeOrderStatus,
  pub suspicious:            bool,
  pub flag_count:            u32,
  /// Free-text notes about the customer's prior orders.
  pub order_history:         Vec<String>,
  pub verification_required: bool,
  pub date:                  DateTime<Utc>,
  pub created_at:            DateTime<Utc>,
  pub updated_at:            DateTime<Utc>,
  pub messages:              Vec<Message>,
}

impl HistoryBearing for FakeOrderRecord {
  type Entry = Message;

  fn history(&self) -> &[Message] { &self.messages }
}

/// Input to [`crate::lifecycle::create_fake_order`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewFakeOrder {
  pub order_id:              String,
  pub customer:              String,
  pub phone:                 String,
  pub address:               String,
  pub amount:                f64,
  #[serde(default = "default_status")]
  pub status:                FakeOrderStatus,
  #[serde(default)]
  pub suspicious:            bool,
  #[serde(default)]
  pub flag_count:            u32,
  #[serde(default)]
  pub order_history:         Vec<String>,
  #[serde(default)]
  pub verification_required: bool,
}

fn default_status() -> FakeOrderStatus { FakeOrderStatus::New }

// ─── Change set ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flags {
  pub flag_count: u32,
  pub suspicious: bool,
}

/// Everything a single fake-order write may touch. `updated_at` is bumped on
/// every applied change.
#[derive(Debug, Clone, Default)]
pub struct FakeOrderChange {
  pub status: Option<FakeOrderStatus>,
  pub flags:  Option<Flags>,
  pub append: Vec<Message>,
}

// ─── Frontend projection ─────────────────────────────────────────────────────

/// The record plus the aliases the review grid binds to. `date` is rendered
/// `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize)]
pub struct FakeOrderView {
  pub id:                    String,
  pub order_id:              String,
  pub customer:              String,
  pub phone:                 String,
  pub address:               String,
  pub amount:                f64,
  pub status:                FakeOrderStatus,
  pub suspicious:            bool,
  pub flag_count:            u32,
  #[serde(rename = "flagCount")]
  pub flag_count_alias:      u32,
  pub order_history:         Vec<String>,
  #[serde(rename = "orderHistory")]
  pub order_history_alias:   Vec<String>,
  pub verification_required: bool,
  #[serde(rename = "verificationRequired")]
  pub verification_alias:    bool,
  pub date:                  String,
  pub created_at:            DateTime<Utc>,
  pub updated_at:            DateTime<Utc>,
  pub last_activity:         Option<DateTime<Utc>>,
  pub messages:              Vec<Message>,
}

impl From<FakeOrderRecord> for FakeOrderView {
  fn from(r: FakeOrderRecord) -> Self {
    Self {
      id:                    r.order_id.clone(),
      last_activity:         r.last_activity(),
      date:                  format::date(r.date),
      flag_count_alias:      r.flag_count,
      order_history_alias:   r.order_history.clone(),
      verification_alias:    r.verification_required,
      order_id:              r.order_id,
      customer:              r.customer,
      phone:                 r.phone,
      address:               r.address,
      amount:                r.amount,
      status:                r.status,
      suspicious:            r.suspicious,
      flag_count:            r.flag_count,
      order_history:         r.order_history,
      verification_required: r.verification_required,
      created_at:            r.created_at,
      updated_at:            r.updated_at,
      messages:              r.messages,
    }
  }
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FakeOrderStats {
  #[serde(flatten)]
  pub by_status:  StatusCounts,
  pub total:      usize,
  pub suspicious: usize,
}

pub fn fake_order_stats(records: &[FakeOrderRecord]) -> FakeOrderStats {
  let by_status = StatusCounts::tally(records.iter().map(|r| r.status));
  FakeOrderStats {
    total: by_status.total(),
    suspicious: records.iter().filter(|r| r.suspicious).count(),
    by_status,
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::history::Sender;

  pub fn record(id: &str, status: FakeOrderStatus, suspicious: bool) -> FakeOrderRecord {
    let at = Utc.with_ymd_and_hms(2025, 5, 21, 9, 30, 0).unwrap();
    FakeOrderRecord {
      order_id: id.into(),
      customer: "Daniel Johnson".into(),
      phone: "+1 (555) 333-4444".into(),
      address: "456 Pine Ave, Chicago, IL".into(),
      amount: 1299.99,
      status,
      suspicious,
      flag_count: u32::from(suspicious),
      order_history: vec!["Previous canceled order".into()],
      verification_required: suspicious,
      date: at,
      created_at: at,
      updated_at: at,
      messages: Vec::new(),
    }
  }

  #[test]
  fn stats_count_statuses_and_suspicious() {
    let records = [
      record("ORD-1", FakeOrderStatus::New, false),
      record("ORD-2", FakeOrderStatus::Flagged, true),
      record("ORD-3", FakeOrderStatus::Flagged, true),
    ];
    let stats = fake_order_stats(&records);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.suspicious, 2);
    assert_eq!(stats.by_status.get(FakeOrderStatus::Flagged), 2);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["flagged"], 2);
    assert_eq!(json["canceled"], 0);
    assert_eq!(json["total"], 3);
  }

  #[test]
  fn view_carries_camel_case_aliases() {
    let mut r = record("ORD-2002", FakeOrderStatus::Checking, true);
    r.messages.push(Message::new("New order received", Sender::System));
    let json = serde_json::to_value(FakeOrderView::from(r)).unwrap();
    assert_eq!(json["id"], "ORD-2002");
    assert_eq!(json["date"], "2025-05-21");
    assert_eq!(json["flagCount"], 1);
    assert_eq!(json["flag_count"], 1);
    assert_eq!(json["verificationRequired"], true);
    assert_eq!(json["orderHistory"][0], "Previous canceled order");
    assert_eq!(json["messages"][0]["sender"], "system");
    assert!(json["last_activity"].is_string());
  }
}
