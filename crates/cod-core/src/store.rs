//! The `DashboardStore` trait.
//!
//! Implemented by storage backends (e.g. `cod-store-sqlite`). The lifecycle
//! mutators and the HTTP layer depend on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  delivery::{Delivery, DeliveryFilter},
  fake_order::{FakeOrderChange, FakeOrderRecord},
  high_risk::{HighRiskAreaRecord, HighRiskChange},
  order::{Order, OrderChange, OrderFilter},
  status::{FakeOrderStatus, HighRiskStatus},
  user::User,
};

/// Lift a backend error into the core taxonomy.
pub fn store_error<E: Into<crate::Error>>(err: E) -> crate::Error { err.into() }

/// Abstraction over a dashboard document store.
///
/// History is append-only: the `apply_*_change` methods push entries without
/// reading the existing history, so concurrent appends to one record are all
/// kept. When a change carries both a status and entries, both land in one
/// atomic write or neither does.
///
/// Every `apply_*` and `delete_*` method reports `false` when the keyed
/// record does not exist rather than failing.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DashboardStore: Send + Sync {
  /// Backend error. Conversion into [`crate::Error`] must map unique-key
  /// conflicts to [`crate::Error::DuplicateKey`].
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;

  // ── Orders ────────────────────────────────────────────────────────────

  /// Persist a new order with its initial history. Fails on a duplicate
  /// `order_id`.
  fn insert_order(
    &self,
    order: Order,
  ) -> impl Future<Output = Result<Order, Self::Error>> + Send + '_;

  fn get_order<'a>(
    &'a self,
    order_id: &'a str,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + 'a;

  /// Orders matching `filter`, most recently created first.
  fn list_orders<'a>(
    &'a self,
    filter: &'a OrderFilter,
  ) -> impl Future<Output = Result<Vec<Order>, Self::Error>> + Send + 'a;

  /// The most recently created order whose last `-`-separated id segment
  /// (or whole id, when it has no `-`) equals `suffix`.
  fn find_order_by_suffix<'a>(
    &'a self,
    suffix: &'a str,
  ) -> impl Future<Output = Result<Option<Order>, Self::Error>> + Send + 'a;

  fn apply_order_change<'a>(
    &'a self,
    order_id: &'a str,
    change: OrderChange,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Deliveries ────────────────────────────────────────────────────────

  /// Fails on a duplicate `tracking` number.
  fn insert_delivery(
    &self,
    delivery: Delivery,
  ) -> impl Future<Output = Result<Delivery, Self::Error>> + Send + '_;

  fn get_delivery<'a>(
    &'a self,
    tracking: &'a str,
  ) -> impl Future<Output = Result<Option<Delivery>, Self::Error>> + Send + 'a;

  /// Deliveries matching `filter`, most recently created first.
  fn list_deliveries<'a>(
    &'a self,
    filter: &'a DeliveryFilter,
  ) -> impl Future<Output = Result<Vec<Delivery>, Self::Error>> + Send + 'a;

  // ── Fake orders ───────────────────────────────────────────────────────

  fn insert_fake_order(
    &self,
    record: FakeOrderRecord,
  ) -> impl Future<Output = Result<FakeOrderRecord, Self::Error>> + Send + '_;

  fn get_fake_order<'a>(
    &'a self,
    order_id: &'a str,
  ) -> impl Future<Output = Result<Option<FakeOrderRecord>, Self::Error>> + Send + 'a;

  /// Records with the given status (all when `None`), newest `date` first.
  fn list_fake_orders(
    &self,
    status: Option<FakeOrderStatus>,
  ) -> impl Future<Output = Result<Vec<FakeOrderRecord>, Self::Error>> + Send + '_;

  fn apply_fake_order_change<'a>(
    &'a self,
    order_id: &'a str,
    change: FakeOrderChange,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn delete_fake_order<'a>(
    &'a self,
    order_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── High-risk orders ──────────────────────────────────────────────────

  fn insert_high_risk_order(
    &self,
    record: HighRiskAreaRecord,
  ) -> impl Future<Output = Result<HighRiskAreaRecord, Self::Error>> + Send + '_;

  fn get_high_risk_order<'a>(
    &'a self,
    order_id: &'a str,
  ) -> impl Future<Output = Result<Option<HighRiskAreaRecord>, Self::Error>> + Send + 'a;

  /// Records with the given status (all when `None`), newest `date` first.
  fn list_high_risk_orders(
    &self,
    status: Option<HighRiskStatus>,
  ) -> impl Future<Output = Result<Vec<HighRiskAreaRecord>, Self::Error>> + Send + '_;

  fn apply_high_risk_change<'a>(
    &'a self,
    order_id: &'a str,
    change: HighRiskChange,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn delete_high_risk_order<'a>(
    &'a self,
    order_id: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Fails on a duplicate email.
  fn insert_user(&self, user: User) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(&self, user_id: Uuid) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;
}
