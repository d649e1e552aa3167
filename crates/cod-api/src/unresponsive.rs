//! Handlers for `/unresponsive-customers` endpoints.
//!
//! Every row here is derived on read from the stored orders; nothing about a
//! customer's contact state is persisted.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/unresponsive-customers` | Optional `?status_filter=<contact status>\|all` |
//! | `GET`  | `/unresponsive-customers/reminders` | Every reminder, newest first |
//! | `GET`  | `/unresponsive-customers/resolved` | Resolved customers, newest first |
//! | `PUT`  | `/unresponsive-customers/{customer_id}/action` | `?action=<a>[&note=<text>]` |
//! | `GET`  | `/unresponsive-customers/stats/summary` | Count per contact status |
//! | `GET`  | `/unresponsive-customers/stats/reminders` | Reminder buckets |
//! | `GET`  | `/unresponsive-customers/stats/resolved` | Resolution buckets |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::Utc;
use cod_core::{
  contact::ContactStatus,
  lifecycle,
  order::{Order, OrderFilter},
  report::{
    self, ReminderRecord, ReminderStats, ResolvedCustomer, ResolvedStats, UnresponsiveCustomer,
    UnresponsiveStats,
  },
  status::parse_filter,
  store::{DashboardStore, store_error},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

async fn load_orders<S: DashboardStore>(
  state: &ApiState<S>,
  filter: OrderFilter,
) -> Result<Vec<Order>, ApiError> {
  Ok(state.store.list_orders(&filter).await.map_err(store_error)?)
}

// ─── Grid ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status_filter: Option<String>,
}

/// `GET /unresponsive-customers[?status_filter=<status>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<UnresponsiveCustomer>>, ApiError>
where
  S: DashboardStore,
{
  let filter = parse_filter::<ContactStatus>(params.status_filter.as_deref())?;
  let orders = load_orders(&state, OrderFilter::awaiting_confirmation()).await?;
  Ok(Json(report::unresponsive_customers(&orders, filter, Utc::now())))
}

/// `GET /unresponsive-customers/reminders`
pub async fn reminders<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<ReminderRecord>>, ApiError>
where
  S: DashboardStore,
{
  let orders = load_orders(&state, OrderFilter::default()).await?;
  Ok(Json(report::reminder_history(&orders, Utc::now())))
}

/// `GET /unresponsive-customers/resolved`
pub async fn resolved<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<ResolvedCustomer>>, ApiError>
where
  S: DashboardStore,
{
  let orders = load_orders(&state, OrderFilter::default()).await?;
  Ok(Json(report::resolved_customers(&orders)))
}

// ─── Actions ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActionParams {
  pub action: Option<String>,
  pub note:   Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActionReceipt {
  pub message:     String,
  pub customer_id: String,
  pub customer:    UnresponsiveCustomer,
}

/// `PUT /unresponsive-customers/{customer_id}/action?action=<a>[&note=<text>]`
///
/// `action` is one of `send_reminder`, `call_customer`, `mark_resolved`.
pub async fn action<S>(
  State(state): State<ApiState<S>>,
  Path(customer_id): Path<String>,
  Query(params): Query<ActionParams>,
) -> Result<Json<ActionReceipt>, ApiError>
where
  S: DashboardStore,
{
  let action = params
    .action
    .ok_or_else(|| ApiError::BadRequest("action is required".into()))?;
  let order =
    lifecycle::record_action(state.store.as_ref(), &customer_id, &action, params.note.as_deref())
      .await?;
  tracing::info!(%customer_id, order_id = %order.order_id, %action, "customer action recorded");

  Ok(Json(ActionReceipt {
    message: format!("Action '{action}' updated successfully"),
    customer: UnresponsiveCustomer::project(&order, Utc::now()),
    customer_id,
  }))
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// `GET /unresponsive-customers/stats/summary`
pub async fn stats<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<UnresponsiveStats>, ApiError>
where
  S: DashboardStore,
{
  let orders = load_orders(&state, OrderFilter::awaiting_confirmation()).await?;
  Ok(Json(report::unresponsive_stats(&orders, Utc::now())))
}

/// `GET /unresponsive-customers/stats/reminders`
pub async fn reminder_stats<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<ReminderStats>, ApiError>
where
  S: DashboardStore,
{
  let orders = load_orders(&state, OrderFilter::default()).await?;
  Ok(Json(report::reminder_stats(&orders, Utc::now())))
}

/// `GET /unresponsive-customers/stats/resolved`
pub async fn resolved_stats<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<ResolvedStats>, ApiError>
where
  S: DashboardStore,
{
  let orders = load_orders(&state, OrderFilter::default()).await?;
  Ok(Json(report::resolved_stats(&orders, Utc::now())))
}
