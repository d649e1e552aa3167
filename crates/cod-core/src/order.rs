//! Orders awaiting cash-on-delivery confirmation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  format,
  history::{HistoryBearing, HistoryEntry, RecordChange},
  status::OrderStatus,
};

// ─── Order ───────────────────────────────────────────────────────────────────

/// The central entity. `order_id` and `created_date` never change after
/// creation; `status` and `confirmation_history` change only through
/// [`crate::lifecycle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
  pub order_id:             String,
  pub tracking_id:          Option<String>,
  pub assigned_courier:     Option<String>,
  pub customer_name:        String,
  pub customer_address:     String,
  pub customer_email:       String,
  pub customer_phone:       String,
  pub total_price:          f64,
  pub status:               OrderStatus,
  pub created_date:         DateTime<Utc>,
  pub confirmation_history: Vec<HistoryEntry>,
}

impl HistoryBearing for Order {
  type Entry = HistoryEntry;

  fn history(&self) -> &[HistoryEntry] { &self.confirmation_history }
}

impl Order {
  /// The customer-facing key used by the unresponsive-customers dashboard:
  /// `CUST-` followed by the last `-`-separated segment of the order id.
  pub fn customer_id(&self) -> String {
    let suffix = self.order_id.rsplit('-').next().unwrap_or(&self.order_id);
    format!("CUST-{suffix}")
  }
}

/// Strip the `CUST-` prefix from a customer id, leaving the order-id suffix it
/// was derived from.
pub fn order_suffix(customer_id: &str) -> &str {
  customer_id.strip_prefix("CUST-").unwrap_or(customer_id)
}

/// Status and history written together by
/// [`crate::store::DashboardStore::apply_order_change`].
pub type OrderChange = RecordChange<OrderStatus, HistoryEntry>;

// ─── NewOrder ────────────────────────────────────────────────────────────────

/// Input to [`crate::lifecycle::create_order`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
  pub order_id:             String,
  #[serde(default)]
  pub tracking_id:          Option<String>,
  #[serde(default)]
  pub assigned_courier:     Option<String>,
  pub customer_name:        String,
  pub customer_address:     String,
  pub customer_email:       String,
  pub customer_phone:       String,
  pub total_price:          f64,
  #[serde(default = "default_order_status")]
  pub status:               OrderStatus,
  /// Defaults to the time of creation.
  #[serde(default)]
  pub created_date:         Option<DateTime<Utc>>,
  #[serde(default)]
  pub confirmation_history: Vec<HistoryEntry>,
}

fn default_order_status() -> OrderStatus { OrderStatus::Pending }

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::DashboardStore::list_orders`].
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
  /// Restrict to these statuses. Empty means every status.
  pub statuses: Vec<OrderStatus>,
}

impl OrderFilter {
  pub fn status(status: Option<OrderStatus>) -> Self {
    Self {
      statuses: status.into_iter().collect(),
    }
  }

  pub fn awaiting_confirmation() -> Self {
    Self {
      statuses: OrderStatus::awaiting_confirmation().to_vec(),
    }
  }
}

// ─── Frontend projection ─────────────────────────────────────────────────────

/// A history entry with its timestamp rendered as a 12-hour clock.
#[derive(Debug, Clone, Serialize)]
pub struct ClockEntry {
  #[serde(rename = "type")]
  pub kind:      String,
  pub content:   String,
  pub timestamp: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub status:    Option<String>,
}

impl From<&HistoryEntry> for ClockEntry {
  fn from(e: &HistoryEntry) -> Self {
    Self {
      kind:      e.kind.clone(),
      content:   e.content.clone(),
      timestamp: format::clock(e.timestamp),
      status:    e.status.clone(),
    }
  }
}

/// The order shape consumed by the confirmation dashboard: the stored fields
/// plus the short aliases the grid binds to.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
  #[serde(flatten)]
  pub order:    Order,
  pub id:       String,
  pub customer: String,
  pub date:     String,
  pub tracking: String,
  pub children: Vec<ClockEntry>,
}

impl From<Order> for OrderView {
  fn from(order: Order) -> Self {
    Self {
      id:       order.order_id.clone(),
      customer: order.customer_name.clone(),
      date:     format::date(order.created_date),
      tracking: order.tracking_id.clone().unwrap_or_default(),
      children: order.confirmation_history.iter().map(ClockEntry::from).collect(),
      order,
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::history::kinds;

  /// An order with the given status created `age` before `now`.
  pub fn order_aged(
    id: &str,
    status: OrderStatus,
    now: DateTime<Utc>,
    age: Duration,
  ) -> Order {
    Order {
      order_id:             id.to_owned(),
      tracking_id:          None,
      assigned_courier:     None,
      customer_name:        "Fatima Ali".into(),
      customer_address:     "House 45, Street 12, DHA Phase 2, Lahore".into(),
      customer_email:       "fatima.ali@example.com".into(),
      customer_phone:       "+92300234567".into(),
      total_price:          2500.0,
      status,
      created_date:         now - age,
      confirmation_history: Vec::new(),
    }
  }

  #[test]
  fn customer_id_uses_last_segment() {
    let now = Utc::now();
    let order = order_aged("ORD-615929564372", OrderStatus::Pending, now, Duration::zero());
    assert_eq!(order.customer_id(), "CUST-615929564372");
    assert_eq!(order_suffix("CUST-615929564372"), "615929564372");
  }

  #[test]
  fn view_adds_aliases_and_clock_children() {
    let created = Utc.with_ymd_and_hms(2025, 5, 20, 10, 30, 0).unwrap();
    let mut order = order_aged("ORD-1", OrderStatus::Confirmed, created, Duration::zero());
    order.confirmation_history.push(
      HistoryEntry::new(kinds::RESPONSE, "YES", created + Duration::minutes(15))
        .with_status("responded"),
    );

    let json = serde_json::to_value(OrderView::from(order)).unwrap();
    assert_eq!(json["id"], "ORD-1");
    assert_eq!(json["order_id"], "ORD-1");
    assert_eq!(json["customer"], "Fatima Ali");
    assert_eq!(json["date"], "2025-05-20");
    assert_eq!(json["tracking"], "");
    assert_eq!(json["status"], "confirmed");
    assert_eq!(json["children"][0]["timestamp"], "10:45 AM");
    assert_eq!(json["children"][0]["status"], "responded");
  }
}
