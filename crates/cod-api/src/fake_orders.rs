//! Handlers for `/fake-orders` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/fake-orders` | Optional `?status=<status>\|all` |
//! | `POST`   | `/fake-orders` | Body: [`NewFakeOrder`] |
//! | `GET`    | `/fake-orders/{order_id}` | 404 if not found |
//! | `DELETE` | `/fake-orders/{order_id}` | Drops the record and its messages |
//! | `PUT`    | `/fake-orders/{order_id}/status` | Body: `{"status":..., "message_text"?:...}` |
//! | `PUT`    | `/fake-orders/{order_id}/flag` | Body: `{"flag_count":..., "suspicious"?:..., "message_text"?:...}` |
//! | `POST`   | `/fake-orders/{order_id}/messages` | Body: `{"message_text":..., "sender"?:...}` |
//! | `GET`    | `/fake-orders/stats/summary` | Counts per status plus suspicious |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cod_core::{
  fake_order::{self, FakeOrderStats, FakeOrderView, Flags, NewFakeOrder},
  lifecycle,
  status::{FakeOrderStatus, parse_filter},
  store::{DashboardStore, store_error},
};
use serde::Deserialize;

use crate::{Ack, ApiState, error::ApiError};

// ─── Reads ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<String>,
}

/// `GET /fake-orders[?status=<status>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<FakeOrderView>>, ApiError>
where
  S: DashboardStore,
{
  let status = parse_filter::<FakeOrderStatus>(params.status.as_deref())?;
  let records = state
    .store
    .list_fake_orders(status)
    .await
    .map_err(store_error)?;
  Ok(Json(records.into_iter().map(FakeOrderView::from).collect()))
}

/// `GET /fake-orders/{order_id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
) -> Result<Json<FakeOrderView>, ApiError>
where
  S: DashboardStore,
{
  let record = state
    .store
    .get_fake_order(&order_id)
    .await
    .map_err(store_error)?
    .ok_or_else(|| ApiError::NotFound(format!("fake order {order_id}")))?;
  Ok(Json(FakeOrderView::from(record)))
}

/// `GET /fake-orders/stats/summary`
pub async fn stats<S>(State(state): State<ApiState<S>>) -> Result<Json<FakeOrderStats>, ApiError>
where
  S: DashboardStore,
{
  let records = state
    .store
    .list_fake_orders(None)
    .await
    .map_err(store_error)?;
  Ok(Json(fake_order::fake_order_stats(&records)))
}

// ─── Create / delete ─────────────────────────────────────────────────────────

/// `POST /fake-orders`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewFakeOrder>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DashboardStore,
{
  let record = lifecycle::create_fake_order(state.store.as_ref(), body).await?;
  tracing::info!(order_id = %record.order_id, "fake-order record created");
  Ok((StatusCode::CREATED, Json(FakeOrderView::from(record))))
}

/// `DELETE /fake-orders/{order_id}`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
) -> Result<Json<Ack>, ApiError>
where
  S: DashboardStore,
{
  lifecycle::delete_fake_order(state.store.as_ref(), &order_id).await?;
  tracing::info!(%order_id, "fake-order record deleted");
  Ok(Json(Ack::new(format!("Order {order_id} deleted successfully"))))
}

// ─── Mutators ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status:       String,
  #[serde(default)]
  pub message_text: Option<String>,
}

/// `PUT /fake-orders/{order_id}/status`
pub async fn update_status<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
  Json(body): Json<StatusBody>,
) -> Result<Json<FakeOrderView>, ApiError>
where
  S: DashboardStore,
{
  let record = lifecycle::update_fake_order_status(
    state.store.as_ref(),
    &order_id,
    &body.status,
    body.message_text.as_deref(),
  )
  .await?;
  Ok(Json(FakeOrderView::from(record)))
}

#[derive(Debug, Deserialize)]
pub struct FlagBody {
  pub flag_count:   u32,
  #[serde(default = "flagged")]
  pub suspicious:   bool,
  #[serde(default)]
  pub message_text: Option<String>,
}

fn flagged() -> bool { true }

/// `PUT /fake-orders/{order_id}/flag`
pub async fn update_flags<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
  Json(body): Json<FlagBody>,
) -> Result<Json<FakeOrderView>, ApiError>
where
  S: DashboardStore,
{
  let flags = Flags {
    flag_count: body.flag_count,
    suspicious: body.suspicious,
  };
  let record = lifecycle::update_fake_order_flags(
    state.store.as_ref(),
    &order_id,
    flags,
    body.message_text.as_deref(),
  )
  .await?;
  Ok(Json(FakeOrderView::from(record)))
}

#[derive(Debug, Deserialize)]
pub struct MessageBody {
  pub message_text: String,
  #[serde(default)]
  pub sender:       Option<String>,
}

/// `POST /fake-orders/{order_id}/messages`
pub async fn add_message<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
  Json(body): Json<MessageBody>,
) -> Result<Json<FakeOrderView>, ApiError>
where
  S: DashboardStore,
{
  let sender = body.sender.as_deref().map(lifecycle::parse_sender).transpose()?;
  let record =
    lifecycle::add_fake_order_message(state.store.as_ref(), &order_id, &body.message_text, sender)
      .await?;
  Ok(Json(FakeOrderView::from(record)))
}
