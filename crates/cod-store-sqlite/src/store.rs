//! [`SqliteStore`], the SQLite implementation of [`DashboardStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use cod_core::{
  delivery::{Delivery, DeliveryFilter},
  fake_order::{FakeOrderChange, FakeOrderRecord},
  high_risk::{HighRiskAreaRecord, HighRiskChange},
  order::{Order, OrderChange, OrderFilter},
  status::{FakeOrderStatus, HighRiskStatus},
  store::DashboardStore,
  user::User,
};

use crate::{
  Error, Result,
  encode::{
    DELIVERY_COLUMNS, FAKE_ORDER_COLUMNS, HIGH_RISK_COLUMNS, HISTORY_COLUMNS, MESSAGE_COLUMNS,
    ORDER_COLUMNS, RawDelivery, RawFakeOrder, RawHighRisk, RawHistoryEntry, RawMessage, RawOrder,
    RawUser, USER_COLUMNS, encode_dt, encode_list, encode_uuid,
  },
  schema::SCHEMA,
};

const FAKE_MESSAGES: &str = "fake_order_messages";
const HIGH_RISK_MESSAGES: &str = "high_risk_messages";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A dashboard store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Flush and close the underlying connection.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────
//
// These run on the connection thread, inside `Connection::call`.

fn select_orders(
  conn: &rusqlite::Connection,
  tail: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<RawOrder>> {
  let mut stmt = conn.prepare(&format!("SELECT {ORDER_COLUMNS} FROM orders {tail}"))?;
  let mut raws = stmt
    .query_map(params, RawOrder::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut history = conn.prepare(&format!(
    "SELECT {HISTORY_COLUMNS} FROM order_history WHERE order_id = ?1 ORDER BY seq"
  ))?;
  for raw in &mut raws {
    raw.history = history
      .query_map([&raw.order_id], RawHistoryEntry::from_row)?
      .collect::<rusqlite::Result<Vec<_>>>()?;
  }
  Ok(raws)
}

fn insert_history(
  conn: &rusqlite::Connection,
  order_id: &str,
  entries: &[RawHistoryEntry],
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(
    "INSERT INTO order_history (order_id, entry_type, content, timestamp, status)
     VALUES (?1, ?2, ?3, ?4, ?5)",
  )?;
  for e in entries {
    stmt.execute(rusqlite::params![order_id, e.entry_type, e.content, e.timestamp, e.status])?;
  }
  Ok(())
}

fn select_messages(
  conn: &rusqlite::Connection,
  table: &str,
  order_id: &str,
) -> rusqlite::Result<Vec<RawMessage>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {MESSAGE_COLUMNS} FROM {table} WHERE order_id = ?1 ORDER BY seq"
  ))?;
  stmt
    .query_map([order_id], RawMessage::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()
}

fn insert_messages(
  conn: &rusqlite::Connection,
  table: &str,
  order_id: &str,
  messages: &[RawMessage],
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(&format!(
    "INSERT INTO {table} (order_id, message_id, text, sender, timestamp)
     VALUES (?1, ?2, ?3, ?4, ?5)"
  ))?;
  for m in messages {
    stmt.execute(rusqlite::params![order_id, m.message_id, m.text, m.sender, m.timestamp])?;
  }
  Ok(())
}

fn select_fake_orders(
  conn: &rusqlite::Connection,
  tail: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<RawFakeOrder>> {
  let mut stmt = conn.prepare(&format!("SELECT {FAKE_ORDER_COLUMNS} FROM fake_orders {tail}"))?;
  let mut raws = stmt
    .query_map(params, RawFakeOrder::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  for raw in &mut raws {
    raw.messages = select_messages(conn, FAKE_MESSAGES, &raw.order_id)?;
  }
  Ok(raws)
}

fn select_high_risk(
  conn: &rusqlite::Connection,
  tail: &str,
  params: impl rusqlite::Params,
) -> rusqlite::Result<Vec<RawHighRisk>> {
  let mut stmt =
    conn.prepare(&format!("SELECT {HIGH_RISK_COLUMNS} FROM high_risk_orders {tail}"))?;
  let mut raws = stmt
    .query_map(params, RawHighRisk::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  for raw in &mut raws {
    raw.messages = select_messages(conn, HIGH_RISK_MESSAGES, &raw.order_id)?;
  }
  Ok(raws)
}

// ─── DashboardStore impl ─────────────────────────────────────────────────────

impl DashboardStore for SqliteStore {
  type Error = Error;

  // ── Orders ────────────────────────────────────────────────────────────────

  async fn insert_order(&self, order: Order) -> Result<Order> {
    let raw = RawOrder::encode(&order);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "INSERT OR IGNORE INTO orders (
             order_id, tracking_id, assigned_courier, customer_name, customer_address,
             customer_email, customer_phone, total_price, status, created_date
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            raw.order_id,
            raw.tracking_id,
            raw.assigned_courier,
            raw.customer_name,
            raw.customer_address,
            raw.customer_email,
            raw.customer_phone,
            raw.total_price,
            raw.status,
            raw.created_date,
          ],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        insert_history(&tx, &raw.order_id, &raw.history)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::Duplicate(format!("order {}", order.order_id)));
    }
    Ok(order)
  }

  async fn get_order<'a>(&'a self, order_id: &'a str) -> Result<Option<Order>> {
    let id = order_id.to_owned();

    let raws = self
      .conn
      .call(move |conn| Ok(select_orders(conn, "WHERE order_id = ?1", [&id])?))
      .await?;

    raws.into_iter().next().map(RawOrder::into_order).transpose()
  }

  async fn list_orders<'a>(&'a self, filter: &'a OrderFilter) -> Result<Vec<Order>> {
    let statuses = if filter.statuses.is_empty() {
      None
    } else {
      let names: Vec<String> = filter.statuses.iter().map(|s| s.as_ref().to_owned()).collect();
      Some(encode_list(&names)?)
    };

    let raws = self
      .conn
      .call(move |conn| {
        Ok(select_orders(
          conn,
          "WHERE (?1 IS NULL OR status IN (SELECT value FROM json_each(?1)))
           ORDER BY created_date DESC, rowid DESC",
          rusqlite::params![statuses],
        )?)
      })
      .await?;

    raws.into_iter().map(RawOrder::into_order).collect()
  }

  async fn find_order_by_suffix<'a>(&'a self, suffix: &'a str) -> Result<Option<Order>> {
    // A segment never contains `-`, so such a suffix can match nothing.
    if suffix.is_empty() || suffix.contains('-') {
      return Ok(None);
    }
    let suffix = suffix.to_owned();

    let raws = self
      .conn
      .call(move |conn| {
        Ok(select_orders(
          conn,
          "WHERE order_id = ?1 OR substr(order_id, -length(?1) - 1) = '-' || ?1
           ORDER BY created_date DESC, rowid DESC LIMIT 1",
          [&suffix],
        )?)
      })
      .await?;

    raws.into_iter().next().map(RawOrder::into_order).transpose()
  }

  async fn apply_order_change<'a>(
    &'a self,
    order_id: &'a str,
    change: OrderChange,
  ) -> Result<bool> {
    let id = order_id.to_owned();
    let status = change.status.map(|s| s.as_ref().to_owned());
    let entries: Vec<RawHistoryEntry> = change.append.iter().map(RawHistoryEntry::encode).collect();

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE orders SET status = COALESCE(?2, status) WHERE order_id = ?1",
          rusqlite::params![id, status],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        insert_history(&tx, &id, &entries)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(found)
  }

  // ── Deliveries ────────────────────────────────────────────────────────────

  async fn insert_delivery(&self, delivery: Delivery) -> Result<Delivery> {
    let raw = RawDelivery::encode(&delivery);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO deliveries (
             tracking, customer_name, customer_phone, customer_address, merchant,
             order_status, no_of_items, courier, city, order_value, created_date
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            raw.tracking,
            raw.customer_name,
            raw.customer_phone,
            raw.customer_address,
            raw.merchant,
            raw.order_status,
            raw.no_of_items,
            raw.courier,
            raw.city,
            raw.order_value,
            raw.created_date,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::Duplicate(format!("delivery {}", delivery.tracking)));
    }
    Ok(delivery)
  }

  async fn get_delivery<'a>(&'a self, tracking: &'a str) -> Result<Option<Delivery>> {
    let tracking = tracking.to_owned();

    let raw: Option<RawDelivery> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {DELIVERY_COLUMNS} FROM deliveries WHERE tracking = ?1"),
            [&tracking],
            RawDelivery::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawDelivery::into_delivery).transpose()
  }

  async fn list_deliveries<'a>(&'a self, filter: &'a DeliveryFilter) -> Result<Vec<Delivery>> {
    let courier = filter.courier.clone();

    let raws: Vec<RawDelivery> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {DELIVERY_COLUMNS} FROM deliveries
           WHERE (?1 IS NULL OR courier = ?1)
           ORDER BY created_date DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![courier], RawDelivery::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDelivery::into_delivery).collect()
  }

  // ── Fake orders ───────────────────────────────────────────────────────────

  async fn insert_fake_order(&self, record: FakeOrderRecord) -> Result<FakeOrderRecord> {
    let raw = RawFakeOrder::encode(&record)?;

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "INSERT OR IGNORE INTO fake_orders (
             order_id, customer, phone, address, amount, status, suspicious, flag_count,
             order_history, verification_required, date, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            raw.order_id,
            raw.customer,
            raw.phone,
            raw.address,
            raw.amount,
            raw.status,
            raw.suspicious,
            raw.flag_count,
            raw.order_history,
            raw.verification_required,
            raw.date,
            raw.created_at,
            raw.updated_at,
          ],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        insert_messages(&tx, FAKE_MESSAGES, &raw.order_id, &raw.messages)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::Duplicate(format!("fake order {}", record.order_id)));
    }
    Ok(record)
  }

  async fn get_fake_order<'a>(&'a self, order_id: &'a str) -> Result<Option<FakeOrderRecord>> {
    let id = order_id.to_owned();

    let raws = self
      .conn
      .call(move |conn| Ok(select_fake_orders(conn, "WHERE order_id = ?1", [&id])?))
      .await?;

    raws.into_iter().next().map(RawFakeOrder::into_record).transpose()
  }

  async fn list_fake_orders(
    &self,
    status: Option<FakeOrderStatus>,
  ) -> Result<Vec<FakeOrderRecord>> {
    let status = status.map(|s| s.as_ref().to_owned());

    let raws = self
      .conn
      .call(move |conn| {
        Ok(select_fake_orders(
          conn,
          "WHERE (?1 IS NULL OR status = ?1) ORDER BY date DESC, rowid DESC",
          rusqlite::params![status],
        )?)
      })
      .await?;

    raws.into_iter().map(RawFakeOrder::into_record).collect()
  }

  async fn apply_fake_order_change<'a>(
    &'a self,
    order_id: &'a str,
    change: FakeOrderChange,
  ) -> Result<bool> {
    let id = order_id.to_owned();
    let status = change.status.map(|s| s.as_ref().to_owned());
    let flag_count = change.flags.map(|f| f.flag_count);
    let suspicious = change.flags.map(|f| f.suspicious);
    let messages: Vec<RawMessage> = change.append.iter().map(RawMessage::encode).collect();
    let now = encode_dt(Utc::now());

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE fake_orders SET
             status     = COALESCE(?2, status),
             flag_count = COALESCE(?3, flag_count),
             suspicious = COALESCE(?4, suspicious),
             updated_at = ?5
           WHERE order_id = ?1",
          rusqlite::params![id, status, flag_count, suspicious, now],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        insert_messages(&tx, FAKE_MESSAGES, &id, &messages)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(found)
  }

  async fn delete_fake_order<'a>(&'a self, order_id: &'a str) -> Result<bool> {
    let id = order_id.to_owned();

    let changed = self
      .conn
      .call(move |conn| Ok(conn.execute("DELETE FROM fake_orders WHERE order_id = ?1", [&id])?))
      .await?;

    Ok(changed > 0)
  }

  // ── High-risk orders ──────────────────────────────────────────────────────

  async fn insert_high_risk_order(&self, record: HighRiskAreaRecord) -> Result<HighRiskAreaRecord> {
    let raw = RawHighRisk::encode(&record)?;

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "INSERT OR IGNORE INTO high_risk_orders (
             order_id, customer, area, address, risk_rate, risk_factors,
             status, date, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            raw.order_id,
            raw.customer,
            raw.area,
            raw.address,
            raw.risk_rate,
            raw.risk_factors,
            raw.status,
            raw.date,
            raw.created_at,
            raw.updated_at,
          ],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        insert_messages(&tx, HIGH_RISK_MESSAGES, &raw.order_id, &raw.messages)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::Duplicate(format!("high-risk order {}", record.order_id)));
    }
    Ok(record)
  }

  async fn get_high_risk_order<'a>(
    &'a self,
    order_id: &'a str,
  ) -> Result<Option<HighRiskAreaRecord>> {
    let id = order_id.to_owned();

    let raws = self
      .conn
      .call(move |conn| Ok(select_high_risk(conn, "WHERE order_id = ?1", [&id])?))
      .await?;

    raws.into_iter().next().map(RawHighRisk::into_record).transpose()
  }

  async fn list_high_risk_orders(
    &self,
    status: Option<HighRiskStatus>,
  ) -> Result<Vec<HighRiskAreaRecord>> {
    let status = status.map(|s| s.as_ref().to_owned());

    let raws = self
      .conn
      .call(move |conn| {
        Ok(select_high_risk(
          conn,
          "WHERE (?1 IS NULL OR status = ?1) ORDER BY date DESC, rowid DESC",
          rusqlite::params![status],
        )?)
      })
      .await?;

    raws.into_iter().map(RawHighRisk::into_record).collect()
  }

  async fn apply_high_risk_change<'a>(
    &'a self,
    order_id: &'a str,
    change: HighRiskChange,
  ) -> Result<bool> {
    let id = order_id.to_owned();
    let status = change.status.map(|s| s.as_ref().to_owned());
    let messages: Vec<RawMessage> = change.append.iter().map(RawMessage::encode).collect();
    let now = encode_dt(Utc::now());

    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let changed = tx.execute(
          "UPDATE high_risk_orders SET status = COALESCE(?2, status), updated_at = ?3
           WHERE order_id = ?1",
          rusqlite::params![id, status, now],
        )?;
        if changed == 0 {
          return Ok(false);
        }
        insert_messages(&tx, HIGH_RISK_MESSAGES, &id, &messages)?;
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(found)
  }

  async fn delete_high_risk_order<'a>(&'a self, order_id: &'a str) -> Result<bool> {
    let id = order_id.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM high_risk_orders WHERE order_id = ?1", [&id])?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn insert_user(&self, user: User) -> Result<User> {
    let id_str = encode_uuid(user.user_id);
    let email = user.email.clone();
    let name = user.name.clone();
    let role = user.role.clone();
    let hash = user.password_hash.clone();
    let at_str = encode_dt(user.created_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT OR IGNORE INTO users (user_id, email, name, role, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, email, name, role, hash, at_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::Duplicate(format!("user {}", user.email)));
    }
    Ok(user)
  }

  async fn get_user(&self, user_id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?1"),
            [&id_str],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_user_by_email<'a>(&'a self, email: &'a str) -> Result<Option<User>> {
    let email = email.trim().to_lowercase();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            [&email],
            RawUser::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }
}
