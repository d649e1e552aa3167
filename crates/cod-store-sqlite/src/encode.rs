//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with microsecond
//! precision, so lexical order equals chronological order. Status enums are
//! stored by their snake_case wire name. String lists are stored as compact
//! JSON. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use cod_core::{
  delivery::Delivery,
  fake_order::FakeOrderRecord,
  high_risk::HighRiskAreaRecord,
  history::{HistoryEntry, Message},
  order::Order,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::UnknownValue {
    column,
    value: s.to_owned(),
  })
}

pub fn encode_list(items: &[String]) -> Result<String> { Ok(serde_json::to_string(items)?) }

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── History rows ────────────────────────────────────────────────────────────

pub const HISTORY_COLUMNS: &str = "entry_type, content, timestamp, status";

/// Raw strings of one `order_history` row.
pub struct RawHistoryEntry {
  pub entry_type: String,
  pub content:    String,
  pub timestamp:  String,
  pub status:     Option<String>,
}

impl RawHistoryEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_type: row.get(0)?,
      content:    row.get(1)?,
      timestamp:  row.get(2)?,
      status:     row.get(3)?,
    })
  }

  pub fn encode(entry: &HistoryEntry) -> Self {
    Self {
      entry_type: entry.kind.clone(),
      content:    entry.content.clone(),
      timestamp:  encode_dt(entry.timestamp),
      status:     entry.status.clone(),
    }
  }

  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      kind:      self.entry_type,
      content:   self.content,
      timestamp: decode_dt(&self.timestamp)?,
      status:    self.status,
    })
  }
}

pub const MESSAGE_COLUMNS: &str = "message_id, text, sender, timestamp";

/// Raw strings of one `*_messages` row.
pub struct RawMessage {
  pub message_id: String,
  pub text:       String,
  pub sender:     String,
  pub timestamp:  String,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id: row.get(0)?,
      text:       row.get(1)?,
      sender:     row.get(2)?,
      timestamp:  row.get(3)?,
    })
  }

  pub fn encode(message: &Message) -> Self {
    Self {
      message_id: message.id.clone(),
      text:       message.text.clone(),
      sender:     message.sender.as_ref().to_owned(),
      timestamp:  encode_dt(message.timestamp),
    }
  }

  pub fn into_message(self) -> Result<Message> {
    Ok(Message {
      id:        self.message_id,
      text:      self.text,
      sender:    decode_enum("sender", &self.sender)?,
      timestamp: decode_dt(&self.timestamp)?,
    })
  }
}

fn decode_all<R, T>(raws: Vec<R>, f: impl Fn(R) -> Result<T>) -> Result<Vec<T>> {
  raws.into_iter().map(f).collect()
}

// ─── Orders ──────────────────────────────────────────────────────────────────

pub const ORDER_COLUMNS: &str = "order_id, tracking_id, assigned_courier, customer_name,
   customer_address, customer_email, customer_phone, total_price, status, created_date";

/// Raw strings read from an `orders` row plus its history rows.
pub struct RawOrder {
  pub order_id:         String,
  pub tracking_id:      Option<String>,
  pub assigned_courier: Option<String>,
  pub customer_name:    String,
  pub customer_address: String,
  pub customer_email:   String,
  pub customer_phone:   String,
  pub total_price:      f64,
  pub status:           String,
  pub created_date:     String,
  pub history:          Vec<RawHistoryEntry>,
}

impl RawOrder {
  /// Reads the [`ORDER_COLUMNS`]; history is filled in separately.
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      order_id:         row.get(0)?,
      tracking_id:      row.get(1)?,
      assigned_courier: row.get(2)?,
      customer_name:    row.get(3)?,
      customer_address: row.get(4)?,
      customer_email:   row.get(5)?,
      customer_phone:   row.get(6)?,
      total_price:      row.get(7)?,
      status:           row.get(8)?,
      created_date:     row.get(9)?,
      history:          Vec::new(),
    })
  }

  pub fn encode(order: &Order) -> Self {
    Self {
      order_id:         order.order_id.clone(),
      tracking_id:      order.tracking_id.clone(),
      assigned_courier: order.assigned_courier.clone(),
      customer_name:    order.customer_name.clone(),
      customer_address: order.customer_address.clone(),
      customer_email:   order.customer_email.clone(),
      customer_phone:   order.customer_phone.clone(),
      total_price:      order.total_price,
      status:           order.status.as_ref().to_owned(),
      created_date:     encode_dt(order.created_date),
      history:          order.confirmation_history.iter().map(RawHistoryEntry::encode).collect(),
    }
  }

  pub fn into_order(self) -> Result<Order> {
    Ok(Order {
      order_id:             self.order_id,
      tracking_id:          self.tracking_id,
      assigned_courier:     self.assigned_courier,
      customer_name:        self.customer_name,
      customer_address:     self.customer_address,
      customer_email:       self.customer_email,
      customer_phone:       self.customer_phone,
      total_price:          self.total_price,
      status:               decode_enum("orders.status", &self.status)?,
      created_date:         decode_dt(&self.created_date)?,
      confirmation_history: decode_all(self.history, RawHistoryEntry::into_entry)?,
    })
  }
}

// ─── Deliveries ──────────────────────────────────────────────────────────────

pub const DELIVERY_COLUMNS: &str = "tracking, customer_name, customer_phone, customer_address,
   merchant, order_status, no_of_items, courier, city, order_value, created_date";

pub struct RawDelivery {
  pub tracking:         String,
  pub customer_name:    String,
  pub customer_phone:   String,
  pub customer_address: String,
  pub merchant:         String,
  pub order_status:     String,
  pub no_of_items:      u32,
  pub courier:          String,
  pub city:             String,
  pub order_value:      i64,
  pub created_date:     String,
}

impl RawDelivery {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tracking:         row.get(0)?,
      customer_name:    row.get(1)?,
      customer_phone:   row.get(2)?,
      customer_address: row.get(3)?,
      merchant:         row.get(4)?,
      order_status:     row.get(5)?,
      no_of_items:      row.get(6)?,
      courier:          row.get(7)?,
      city:             row.get(8)?,
      order_value:      row.get(9)?,
      created_date:     row.get(10)?,
    })
  }

  pub fn encode(d: &Delivery) -> Self {
    Self {
      tracking:         d.tracking.clone(),
      customer_name:    d.customer_name.clone(),
      customer_phone:   d.customer_phone.clone(),
      customer_address: d.customer_address.clone(),
      merchant:         d.merchant.clone(),
      order_status:     d.order_status.clone(),
      no_of_items:      d.no_of_items,
      courier:          d.courier.clone(),
      city:             d.city.clone(),
      order_value:      d.order_value,
      created_date:     encode_dt(d.created_date),
    }
  }

  pub fn into_delivery(self) -> Result<Delivery> {
    Ok(Delivery {
      tracking:         self.tracking,
      customer_name:    self.customer_name,
      customer_phone:   self.customer_phone,
      customer_address: self.customer_address,
      merchant:         self.merchant,
      order_status:     self.order_status,
      no_of_items:      self.no_of_items,
      courier:          self.courier,
      city:             self.city,
      order_value:      self.order_value,
      created_date:     decode_dt(&self.created_date)?,
    })
  }
}

// ─── Fake orders ─────────────────────────────────────────────────────────────

pub const FAKE_ORDER_COLUMNS: &str = "order_id, customer, phone, address, amount, status,
   suspicious, flag_count, order_history, verification_required, date, created_at, updated_at";

pub struct RawFakeOrder {
  pub order_id:              String,
  pub customer:              String,
  pub phone:                 String,
  pub address:               String,
  pub amount:                f64,
  pub status:                String,
  pub suspicious:            bool,
  pub flag_count:            u32,
  pub order_history:         String,
  pub verification_required: bool,
  pub date:                  String,
  pub created_at:            String,
  pub updated_at:            String,
  pub messages:              Vec<RawMessage>,
}

impl RawFakeOrder {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      order_id:              row.get(0)?,
      customer:              row.get(1)?,
      phone:                 row.get(2)?,
      address:               row.get(3)?,
      amount:                row.get(4)?,
      status:                row.get(5)?,
      suspicious:            row.get(6)?,
      flag_count:            row.get(7)?,
      order_history:         row.get(8)?,
      verification_required: row.get(9)?,
      date:                  row.get(10)?,
      created_at:            row.get(11)?,
      updated_at:            row.get(12)?,
      messages:              Vec::new(),
    })
  }

  pub fn encode(r: &FakeOrderRecord) -> Result<Self> {
    Ok(Self {
      order_id:              r.order_id.clone(),
      customer:              r.customer.clone(),
      phone:                 r.phone.clone(),
      address:               r.address.clone(),
      amount:                r.amount,
      status:                r.status.as_ref().to_owned(),
      suspicious:            r.suspicious,
      flag_count:            r.flag_count,
      order_history:         encode_list(&r.order_history)?,
      verification_required: r.verification_required,
      date:                  encode_dt(r.date),
      created_at:            encode_dt(r.created_at),
      updated_at:            encode_dt(r.updated_at),
      messages:              r.messages.iter().map(RawMessage::encode).collect(),
    })
  }

  pub fn into_record(self) -> Result<FakeOrderRecord> {
    Ok(FakeOrderRecord {
      order_id:              self.order_id,
      customer:              self.customer,
      phone:                 self.phone,
      address:               self.address,
      amount:                self.amount,
      status:                decode_enum("fake_orders.status", &self.status)?,
      suspicious:            self.suspicious,
      flag_count:            self.flag_count,
      order_history:         decode_list(&self.order_history)?,
      verification_required: self.verification_required,
      date:                  decode_dt(&self.date)?,
      created_at:            decode_dt(&self.created_at)?,
      updated_at:            decode_dt(&self.updated_at)?,
      messages:              decode_all(self.messages, RawMessage::into_message)?,
    })
  }
}

// ─── High-risk orders ────────────────────────────────────────────────────────

pub const HIGH_RISK_COLUMNS: &str = "order_id, customer, area, address, risk_rate,
   risk_factors, status, date, created_at, updated_at";

pub struct RawHighRisk {
  pub order_id:     String,
  pub customer:     String,
  pub area:         String,
  pub address:      String,
  pub risk_rate:    u8,
  pub risk_factors: String,
  pub status:       String,
  pub date:         String,
  pub created_at:   String,
  pub updated_at:   String,
  pub messages:     Vec<RawMessage>,
}

impl RawHighRisk {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      order_id:     row.get(0)?,
      customer:     row.get(1)?,
      area:         row.get(2)?,
      address:      row.get(3)?,
      risk_rate:    row.get(4)?,
      risk_factors: row.get(5)?,
      status:       row.get(6)?,
      date:         row.get(7)?,
      created_at:   row.get(8)?,
      updated_at:   row.get(9)?,
      messages:     Vec::new(),
    })
  }

  pub fn encode(r: &HighRiskAreaRecord) -> Result<Self> {
    Ok(Self {
      order_id:     r.order_id.clone(),
      customer:     r.customer.clone(),
      area:         r.area.clone(),
      address:      r.address.clone(),
      risk_rate:    r.risk_rate,
      risk_factors: encode_list(&r.risk_factors)?,
      status:       r.status.as_ref().to_owned(),
      date:         encode_dt(r.date),
      created_at:   encode_dt(r.created_at),
      updated_at:   encode_dt(r.updated_at),
      messages:     r.messages.iter().map(RawMessage::encode).collect(),
    })
  }

  pub fn into_record(self) -> Result<HighRiskAreaRecord> {
    Ok(HighRiskAreaRecord {
      order_id:     self.order_id,
      customer:     self.customer,
      area:         self.area,
      address:      self.address,
      risk_rate:    self.risk_rate,
      risk_factors: decode_list(&self.risk_factors)?,
      status:       decode_enum("high_risk_orders.status", &self.status)?,
      date:         decode_dt(&self.date)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
      messages:     decode_all(self.messages, RawMessage::into_message)?,
    })
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "user_id, email, name, role, password_hash, created_at";

pub struct RawUser {
  pub user_id:       String,
  pub email:         String,
  pub name:          String,
  pub role:          String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      email:         row.get(1)?,
      name:          row.get(2)?,
      role:          row.get(3)?,
      password_hash: row.get(4)?,
      created_at:    row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      email:         self.email,
      name:          self.name,
      role:          self.role,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2025, 5, 20, 9, 0, 0).unwrap();
    let b = a + Duration::microseconds(1);
    let c = a + Duration::days(400);
    let (ea, eb, ec) = (encode_dt(a), encode_dt(b), encode_dt(c));
    assert!(ea < eb && eb < ec);
    assert_eq!(ea.len(), ec.len());
    assert_eq!(decode_dt(&eb).unwrap(), b);
  }

  #[test]
  fn unknown_enum_value_is_reported() {
    let err = decode_enum::<cod_core::status::OrderStatus>("orders.status", "shipped").unwrap_err();
    assert!(matches!(err, Error::UnknownValue { column: "orders.status", .. }));
  }
}
