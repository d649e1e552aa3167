//! Lifecycle mutators.
//!
//! These are the only permitted way to change a record's status or append to
//! its history. Each one validates its input before touching the store, so a
//! rejected call leaves the record exactly as it was. Every status change that
//! carries a message is written together with its history entries in one
//! store call.

use chrono::Utc;
use serde::Serialize;
use strum::{AsRefStr, Display, EnumString, VariantNames};

use crate::{
  Error, Result,
  delivery::{Delivery, NewDelivery},
  fake_order::{FakeOrderChange, FakeOrderRecord, Flags, NewFakeOrder},
  high_risk::{HighRiskAreaRecord, HighRiskChange, NewHighRiskOrder, validate_risk_rate},
  history::{HistoryEntry, Message, Sender, kinds},
  order::{NewOrder, Order, OrderChange, order_suffix},
  status::{FakeOrderStatus, HighRiskStatus, OrderStatus, parse_status},
  store::{DashboardStore, store_error},
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// An empty or whitespace-only message counts as no message.
fn non_empty(message: Option<&str>) -> Option<&str> {
  message.filter(|m| !m.trim().is_empty())
}

fn require_id(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::InvalidArgument(format!("{field} must not be empty")));
  }
  Ok(())
}

fn require_amount(field: &str, value: f64) -> Result<()> {
  if !value.is_finite() || value < 0.0 {
    return Err(Error::InvalidArgument(format!(
      "{field} must be greater than or equal to 0"
    )));
  }
  Ok(())
}

fn order_not_found(order_id: &str) -> Error { Error::NotFound(format!("order {order_id}")) }

// ─── Orders ──────────────────────────────────────────────────────────────────

pub async fn create_order<S: DashboardStore>(store: &S, input: NewOrder) -> Result<Order> {
  require_id("order_id", &input.order_id)?;
  require_amount("total_price", input.total_price)?;

  let order = Order {
    order_id:             input.order_id,
    tracking_id:          input.tracking_id,
    assigned_courier:     input.assigned_courier,
    customer_name:        input.customer_name,
    customer_address:     input.customer_address,
    customer_email:       input.customer_email,
    customer_phone:       input.customer_phone,
    total_price:          input.total_price,
    status:               input.status,
    created_date:         input.created_date.unwrap_or_else(Utc::now),
    confirmation_history: input.confirmation_history,
  };
  store.insert_order(order).await.map_err(store_error)
}

async fn apply_order<S: DashboardStore>(
  store: &S,
  order_id: &str,
  change: OrderChange,
) -> Result<Order> {
  if !store.apply_order_change(order_id, change).await.map_err(store_error)? {
    return Err(order_not_found(order_id));
  }
  store
    .get_order(order_id)
    .await
    .map_err(store_error)?
    .ok_or_else(|| order_not_found(order_id))
}

/// Set an order's status. A non-empty `response` is logged as the customer's
/// reply in the same write; see [`record_customer_response`].
///
/// An unrecognised `status` fails with [`Error::InvalidArgument`] before the
/// store is touched.
pub async fn update_order_status<S: DashboardStore>(
  store: &S,
  order_id: &str,
  status: &str,
  response: Option<&str>,
) -> Result<Order> {
  let status: OrderStatus = parse_status(status)?;
  match non_empty(response) {
    Some(text) => record_customer_response(store, order_id, text, status).await,
    None => apply_order(store, order_id, OrderChange::status(status)).await,
  }
}

/// Log the customer's reply as a `Response` entry immediately followed by a
/// `Tag` entry naming `status`, and move the order to `status`, all in one
/// write.
pub async fn record_customer_response<S: DashboardStore>(
  store: &S,
  order_id: &str,
  response: &str,
  status: OrderStatus,
) -> Result<Order> {
  let now = Utc::now();
  let change = OrderChange::status(status)
    .and_append(HistoryEntry::new(kinds::RESPONSE, response, now).with_status("responded"))
    .and_append(HistoryEntry::new(kinds::TAG, status.tag_label(), now));
  apply_order(store, order_id, change).await
}

/// A follow-up action taken from the unresponsive-customers dashboard.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, AsRefStr, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CustomerAction {
  SendReminder,
  CallCustomer,
  MarkResolved,
}

impl CustomerAction {
  /// The history entry type this action logs.
  pub fn entry_kind(self) -> &'static str {
    match self {
      Self::SendReminder => kinds::REMINDER_SENT,
      Self::CallCustomer => kinds::CUSTOMER_CALLED,
      Self::MarkResolved => kinds::MARKED_RESOLVED,
    }
  }

  /// Entry content used when the operator leaves no note.
  pub fn default_note(self) -> &'static str {
    match self {
      Self::SendReminder => "Follow-up reminder sent to customer",
      Self::CallCustomer => "Customer contacted via phone call",
      Self::MarkResolved => "Customer issue marked as resolved",
    }
  }

  fn entry_status(self) -> &'static str {
    match self {
      Self::MarkResolved => "completed",
      _ => "sent",
    }
  }
}

/// Log `action` against the order behind `customer_id` (`CUST-<suffix>`).
/// `mark_resolved` also confirms the order.
///
/// Fails with [`Error::InvalidArgument`] for an unknown action or an empty
/// suffix, and [`Error::NotFound`] when no order id ends with the suffix.
pub async fn record_action<S: DashboardStore>(
  store: &S,
  customer_id: &str,
  action: &str,
  note: Option<&str>,
) -> Result<Order> {
  let action: CustomerAction = action.parse().map_err(|_| {
    Error::InvalidArgument(format!(
      "invalid action {action:?}; must be one of: {}",
      CustomerAction::VARIANTS.join(", ")
    ))
  })?;
  let suffix = order_suffix(customer_id.trim());
  require_id("customer_id", suffix)?;

  let order = store
    .find_order_by_suffix(suffix)
    .await
    .map_err(store_error)?
    .ok_or_else(|| Error::NotFound(format!("customer order {customer_id}")))?;

  let entry = HistoryEntry::new(
    action.entry_kind(),
    non_empty(note).unwrap_or(action.default_note()),
    Utc::now(),
  )
  .with_status(action.entry_status());

  let change = match action {
    CustomerAction::MarkResolved => OrderChange::status(OrderStatus::Confirmed).and_append(entry),
    _ => OrderChange::append(entry),
  };
  apply_order(store, &order.order_id, change).await
}

/// Outcome of [`confirm_orders`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkOutcome {
  pub confirmed: Vec<String>,
  pub missing:   Vec<String>,
}

/// Move each order to `confirmed` without logging a history entry. Unknown
/// ids are collected in [`BulkOutcome::missing`] rather than failing the
/// batch.
pub async fn confirm_orders<S: DashboardStore>(
  store: &S,
  order_ids: &[String],
) -> Result<BulkOutcome> {
  let mut outcome = BulkOutcome::default();
  for order_id in order_ids {
    let found = store
      .apply_order_change(order_id, OrderChange::status(OrderStatus::Confirmed))
      .await
      .map_err(store_error)?;
    if found {
      outcome.confirmed.push(order_id.clone());
    } else {
      outcome.missing.push(order_id.clone());
    }
  }
  Ok(outcome)
}

// ─── Deliveries ──────────────────────────────────────────────────────────────

pub async fn create_delivery<S: DashboardStore>(store: &S, input: NewDelivery) -> Result<Delivery> {
  require_id("tracking", &input.tracking)?;
  require_id("courier", &input.courier)?;
  if input.order_value < 0 {
    return Err(Error::InvalidArgument(
      "order_value must be greater than or equal to 0".into(),
    ));
  }

  let delivery = Delivery {
    tracking:         input.tracking,
    customer_name:    input.customer_name,
    customer_phone:   input.customer_phone,
    customer_address: input.customer_address,
    merchant:         input.merchant,
    order_status:     input.order_status,
    no_of_items:      input.no_of_items,
    courier:          input.courier.trim().to_lowercase(),
    city:             input.city,
    order_value:      input.order_value,
    created_date:     input.created_date.unwrap_or_else(Utc::now),
  };
  store.insert_delivery(delivery).await.map_err(store_error)
}

// ─── Fake orders ─────────────────────────────────────────────────────────────

fn fake_not_found(order_id: &str) -> Error { Error::NotFound(format!("fake order {order_id}")) }

pub async fn create_fake_order<S: DashboardStore>(
  store: &S,
  input: NewFakeOrder,
) -> Result<FakeOrderRecord> {
  require_id("order_id", &input.order_id)?;
  require_amount("amount", input.amount)?;

  let now = Utc::now();
  let record = FakeOrderRecord {
    order_id:              input.order_id,
    customer:              input.customer,
    phone:                 input.phone,
    address:               input.address,
    amount:                input.amount,
    status:                input.status,
    suspicious:            input.suspicious,
    flag_count:            input.flag_count,
    order_history:         input.order_history,
    verification_required: input.verification_required,
    date:                  now,
    created_at:            now,
    updated_at:            now,
    messages:              Vec::new(),
  };
  store.insert_fake_order(record).await.map_err(store_error)
}

async fn apply_fake<S: DashboardStore>(
  store: &S,
  order_id: &str,
  change: FakeOrderChange,
) -> Result<FakeOrderRecord> {
  if !store.apply_fake_order_change(order_id, change).await.map_err(store_error)? {
    return Err(fake_not_found(order_id));
  }
  store
    .get_fake_order(order_id)
    .await
    .map_err(store_error)?
    .ok_or_else(|| fake_not_found(order_id))
}

/// Set a fake order's status, appending `message` as a system message in the
/// same write when given.
pub async fn update_fake_order_status<S: DashboardStore>(
  store: &S,
  order_id: &str,
  status: &str,
  message: Option<&str>,
) -> Result<FakeOrderRecord> {
  let status: FakeOrderStatus = parse_status(status)?;
  let change = FakeOrderChange {
    status: Some(status),
    flags:  None,
    append: system_message(message).into_iter().collect(),
  };
  apply_fake(store, order_id, change).await
}

/// Overwrite the flag counter and suspicion marker, appending `message` as a
/// system message in the same write when given.
pub async fn update_fake_order_flags<S: DashboardStore>(
  store: &S,
  order_id: &str,
  flags: Flags,
  message: Option<&str>,
) -> Result<FakeOrderRecord> {
  let change = FakeOrderChange {
    status: None,
    flags:  Some(flags),
    append: system_message(message).into_iter().collect(),
  };
  apply_fake(store, order_id, change).await
}

pub async fn add_fake_order_message<S: DashboardStore>(
  store: &S,
  order_id: &str,
  text: &str,
  sender: Option<Sender>,
) -> Result<FakeOrderRecord> {
  let message = user_message(text, sender)?;
  apply_fake(store, order_id, FakeOrderChange {
    append: vec![message],
    ..Default::default()
  })
  .await
}

pub async fn delete_fake_order<S: DashboardStore>(store: &S, order_id: &str) -> Result<()> {
  if store.delete_fake_order(order_id).await.map_err(store_error)? {
    Ok(())
  } else {
    Err(fake_not_found(order_id))
  }
}

// ─── High-risk orders ────────────────────────────────────────────────────────

fn high_risk_not_found(order_id: &str) -> Error {
  Error::NotFound(format!("high-risk order {order_id}"))
}

/// Fails with [`Error::InvalidArgument`] unless `risk_rate` is within
/// `0..=100`.
pub async fn create_high_risk_order<S: DashboardStore>(
  store: &S,
  input: NewHighRiskOrder,
) -> Result<HighRiskAreaRecord> {
  require_id("order_id", &input.order_id)?;
  let risk_rate = validate_risk_rate(input.risk_rate)?;

  let now = Utc::now();
  let record = HighRiskAreaRecord {
    order_id: input.order_id,
    customer: input.customer,
    area: input.area,
    address: input.address,
    risk_rate,
    risk_factors: input.risk_factors,
    status: input.status,
    date: now,
    created_at: now,
    updated_at: now,
    messages: Vec::new(),
  };
  store.insert_high_risk_order(record).await.map_err(store_error)
}

async fn apply_high_risk<S: DashboardStore>(
  store: &S,
  order_id: &str,
  change: HighRiskChange,
) -> Result<HighRiskAreaRecord> {
  if !store.apply_high_risk_change(order_id, change).await.map_err(store_error)? {
    return Err(high_risk_not_found(order_id));
  }
  store
    .get_high_risk_order(order_id)
    .await
    .map_err(store_error)?
    .ok_or_else(|| high_risk_not_found(order_id))
}

pub async fn update_high_risk_status<S: DashboardStore>(
  store: &S,
  order_id: &str,
  status: &str,
  message: Option<&str>,
) -> Result<HighRiskAreaRecord> {
  let status: HighRiskStatus = parse_status(status)?;
  let mut change = HighRiskChange::status(status);
  change.append.extend(system_message(message));
  apply_high_risk(store, order_id, change).await
}

pub async fn add_high_risk_message<S: DashboardStore>(
  store: &S,
  order_id: &str,
  text: &str,
  sender: Option<Sender>,
) -> Result<HighRiskAreaRecord> {
  let message = user_message(text, sender)?;
  apply_high_risk(store, order_id, HighRiskChange::append(message)).await
}

pub async fn delete_high_risk_order<S: DashboardStore>(store: &S, order_id: &str) -> Result<()> {
  if store.delete_high_risk_order(order_id).await.map_err(store_error)? {
    Ok(())
  } else {
    Err(high_risk_not_found(order_id))
  }
}

// ─── Messages ────────────────────────────────────────────────────────────────

fn system_message(text: Option<&str>) -> Option<Message> {
  non_empty(text).map(|t| Message::new(t, Sender::System))
}

/// Sender defaults to [`Sender::User`].
fn user_message(text: &str, sender: Option<Sender>) -> Result<Message> {
  let text = non_empty(Some(text))
    .ok_or_else(|| Error::InvalidArgument("message_text must not be empty".into()))?;
  Ok(Message::new(text, sender.unwrap_or_default()))
}

/// Parse a sender name as sent by the dashboard.
pub fn parse_sender(raw: &str) -> Result<Sender> {
  raw.parse().map_err(|_| {
    Error::InvalidArgument(format!(
      "invalid sender {raw:?}; must be one of: {}",
      <Sender as VariantNames>::VARIANTS.join(", ")
    ))
  })
}
