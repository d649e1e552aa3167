//! Handlers for `/orders` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/orders` | Optional `?status=confirmed\|pending\|unconfirmed\|all` |
//! | `POST` | `/orders` | Body: [`NewOrder`]; 409 on a duplicate id |
//! | `GET`  | `/orders/stats/summary` | Counts per status |
//! | `GET`  | `/orders/{order_id}` | 404 if not found |
//! | `PUT`  | `/orders/{order_id}/status` | `?status=<s>[&response_content=<text>]` |
//! | `POST` | `/orders/book-with-postex` etc. | Body: JSON array of order ids |
//! | `POST` | `/orders/confirm` | Body: JSON array of order ids |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cod_core::{
  lifecycle::{self, BulkOutcome},
  order::{NewOrder, OrderFilter, OrderView},
  report::{self, OrderStats},
  status::{OrderStatus, parse_filter},
  store::{DashboardStore, store_error},
};
use serde::{Deserialize, Serialize};

use crate::{
  ApiState,
  courier::{BookingReceipt, BookingTarget},
  error::ApiError,
};

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<String>,
}

/// `GET /orders[?status=<status>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<OrderView>>, ApiError>
where
  S: DashboardStore,
{
  let status = parse_filter::<OrderStatus>(params.status.as_deref())?;
  let orders = state
    .store
    .list_orders(&OrderFilter::status(status))
    .await
    .map_err(store_error)?;
  Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /orders`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewOrder>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DashboardStore,
{
  let order = lifecycle::create_order(state.store.as_ref(), body).await?;
  tracing::info!(order_id = %order.order_id, "order created");
  Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /orders/{order_id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
) -> Result<Json<OrderView>, ApiError>
where
  S: DashboardStore,
{
  let order = state
    .store
    .get_order(&order_id)
    .await
    .map_err(store_error)?
    .ok_or_else(|| ApiError::NotFound(format!("order {order_id}")))?;
  Ok(Json(OrderView::from(order)))
}

// ─── Update status ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusParams {
  pub status:           Option<String>,
  pub response_content: Option<String>,
}

/// `PUT /orders/{order_id}/status?status=<s>[&response_content=<text>]`
///
/// With a response, the order gains a `Response` entry followed by a `Tag`
/// entry in the same write as the status change.
pub async fn update_status<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
  Query(params): Query<StatusParams>,
) -> Result<Json<OrderView>, ApiError>
where
  S: DashboardStore,
{
  let status = params
    .status
    .ok_or_else(|| ApiError::BadRequest("status is required".into()))?;
  let order = lifecycle::update_order_status(
    state.store.as_ref(),
    &order_id,
    &status,
    params.response_content.as_deref(),
  )
  .await?;
  Ok(Json(OrderView::from(order)))
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// `GET /orders/stats/summary`
pub async fn stats<S>(State(state): State<ApiState<S>>) -> Result<Json<OrderStats>, ApiError>
where
  S: DashboardStore,
{
  let orders = state
    .store
    .list_orders(&OrderFilter::default())
    .await
    .map_err(store_error)?;
  Ok(Json(report::order_stats(&orders)))
}

// ─── Courier booking ─────────────────────────────────────────────────────────

async fn book<S>(
  state: &ApiState<S>,
  target: BookingTarget,
  order_ids: &[String],
) -> BookingReceipt {
  let outcome = state.couriers.book(target, order_ids).await;
  BookingReceipt::new(target, order_ids.len(), outcome)
}

/// `POST /orders/book-with-postex`
pub async fn book_postex<S>(
  State(state): State<ApiState<S>>,
  Json(order_ids): Json<Vec<String>>,
) -> Json<BookingReceipt>
where
  S: DashboardStore,
{
  Json(book(&state, BookingTarget::Postex, &order_ids).await)
}

/// `POST /orders/book-with-leopard`
pub async fn book_leopard<S>(
  State(state): State<ApiState<S>>,
  Json(order_ids): Json<Vec<String>>,
) -> Json<BookingReceipt>
where
  S: DashboardStore,
{
  Json(book(&state, BookingTarget::Leopard, &order_ids).await)
}

/// `POST /orders/book-recommended`
pub async fn book_recommended<S>(
  State(state): State<ApiState<S>>,
  Json(order_ids): Json<Vec<String>>,
) -> Json<BookingReceipt>
where
  S: DashboardStore,
{
  Json(book(&state, BookingTarget::Recommended, &order_ids).await)
}

// ─── Bulk confirm ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ConfirmReceipt {
  pub success: bool,
  pub message: String,
  #[serde(flatten)]
  pub outcome: BulkOutcome,
}

/// `POST /orders/confirm`
pub async fn confirm<S>(
  State(state): State<ApiState<S>>,
  Json(order_ids): Json<Vec<String>>,
) -> Result<Json<ConfirmReceipt>, ApiError>
where
  S: DashboardStore,
{
  let outcome = lifecycle::confirm_orders(state.store.as_ref(), &order_ids).await?;
  if !outcome.missing.is_empty() {
    tracing::warn!(missing = ?outcome.missing, "bulk confirm skipped unknown orders");
  }
  Ok(Json(ConfirmReceipt {
    success: true,
    message: format!("Successfully confirmed {} orders", outcome.confirmed.len()),
    outcome,
  }))
}
