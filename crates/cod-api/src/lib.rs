//! JSON REST API for the cash-on-delivery dashboard.
//!
//! Exposes an axum [`Router`] backed by any [`cod_core::store::DashboardStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", cod_api::api_router(state))
//! ```

pub mod courier;
pub mod deliveries;
pub mod error;
pub mod fake_orders;
pub mod high_risk_areas;
pub mod orders;
pub mod unresponsive;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use cod_core::store::DashboardStore;
use serde::Serialize;

pub use courier::{CourierConfig, CourierDispatcher};
pub use error::ApiError;

/// Shared handler state: the store plus the courier webhook client.
pub struct ApiState<S> {
  pub store:    Arc<S>,
  pub couriers: Arc<CourierDispatcher>,
}

impl<S> ApiState<S> {
  pub fn new(store: Arc<S>, couriers: CourierDispatcher) -> Self {
    Self {
      store,
      couriers: Arc::new(couriers),
    }
  }
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      couriers: Arc::clone(&self.couriers),
    }
  }
}

/// `{"message": ...}` acknowledgement body.
#[derive(Debug, Clone, Serialize)]
pub struct Ack {
  pub message: String,
}

impl Ack {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: ApiState<S>) -> Router<()>
where
  S: DashboardStore + 'static,
{
  Router::new()
    // Orders
    .route("/orders", get(orders::list::<S>).post(orders::create::<S>))
    .route("/orders/stats/summary", get(orders::stats::<S>))
    .route("/orders/book-with-postex", post(orders::book_postex::<S>))
    .route("/orders/book-with-leopard", post(orders::book_leopard::<S>))
    .route("/orders/book-recommended", post(orders::book_recommended::<S>))
    .route("/orders/confirm", post(orders::confirm::<S>))
    .route("/orders/{order_id}", get(orders::get_one::<S>))
    .route("/orders/{order_id}/status", put(orders::update_status::<S>))
    // Deliveries
    .route("/deliveries", get(deliveries::list::<S>).post(deliveries::create::<S>))
    .route("/deliveries/stats/couriers", get(deliveries::courier_stats::<S>))
    .route("/deliveries/stats/cities", get(deliveries::city_stats::<S>))
    .route("/deliveries/stats/summary", get(deliveries::summary::<S>))
    .route("/deliveries/{tracking}", get(deliveries::get_one::<S>))
    // Unresponsive customers
    .route("/unresponsive-customers", get(unresponsive::list::<S>))
    .route("/unresponsive-customers/reminders", get(unresponsive::reminders::<S>))
    .route("/unresponsive-customers/resolved", get(unresponsive::resolved::<S>))
    .route("/unresponsive-customers/stats/summary", get(unresponsive::stats::<S>))
    .route("/unresponsive-customers/stats/reminders", get(unresponsive::reminder_stats::<S>))
    .route("/unresponsive-customers/stats/resolved", get(unresponsive::resolved_stats::<S>))
    .route("/unresponsive-customers/{customer_id}/action", put(unresponsive::action::<S>))
    // Fake orders
    .route("/fake-orders", get(fake_orders::list::<S>).post(fake_orders::create::<S>))
    .route("/fake-orders/stats/summary", get(fake_orders::stats::<S>))
    .route(
      "/fake-orders/{order_id}",
      get(fake_orders::get_one::<S>).delete(fake_orders::delete_one::<S>),
    )
    .route("/fake-orders/{order_id}/status", put(fake_orders::update_status::<S>))
    .route("/fake-orders/{order_id}/flag", put(fake_orders::update_flags::<S>))
    .route("/fake-orders/{order_id}/messages", post(fake_orders::add_message::<S>))
    // High-risk areas
    .route(
      "/high-risk-areas",
      get(high_risk_areas::list::<S>).post(high_risk_areas::create::<S>),
    )
    .route("/high-risk-areas/stats/summary", get(high_risk_areas::stats::<S>))
    .route(
      "/high-risk-areas/{order_id}",
      get(high_risk_areas::get_one::<S>).delete(high_risk_areas::delete_one::<S>),
    )
    .route("/high-risk-areas/{order_id}/status", put(high_risk_areas::update_status::<S>))
    .route("/high-risk-areas/{order_id}/messages", post(high_risk_areas::add_message::<S>))
    .with_state(state)
}
