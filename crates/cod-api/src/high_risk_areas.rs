//! Handlers for `/high-risk-areas` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/high-risk-areas` | Optional `?status=<status>\|all` |
//! | `POST`   | `/high-risk-areas` | Body: [`NewHighRiskOrder`]; `risk_rate` must be 0..=100 |
//! | `GET`    | `/high-risk-areas/{order_id}` | 404 if not found |
//! | `DELETE` | `/high-risk-areas/{order_id}` | Drops the record and its messages |
//! | `PUT`    | `/high-risk-areas/{order_id}/status` | Body: `{"status":..., "message_text"?:...}` |
//! | `POST`   | `/high-risk-areas/{order_id}/messages` | Body: `{"message_text":..., "sender"?:...}` |
//! | `GET`    | `/high-risk-areas/stats/summary` | Counts per status |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cod_core::{
  high_risk::{self, HighRiskStats, HighRiskView, NewHighRiskOrder},
  lifecycle,
  status::{HighRiskStatus, parse_filter},
  store::{DashboardStore, store_error},
};

use crate::{
  Ack, ApiState,
  error::ApiError,
  fake_orders::{ListParams, MessageBody, StatusBody},
};

/// `GET /high-risk-areas[?status=<status>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<HighRiskView>>, ApiError>
where
  S: DashboardStore,
{
  let status = parse_filter::<HighRiskStatus>(params.status.as_deref())?;
  let records = state
    .store
    .list_high_risk_orders(status)
    .await
    .map_err(store_error)?;
  Ok(Json(records.into_iter().map(HighRiskView::from).collect()))
}

/// `GET /high-risk-areas/{order_id}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
) -> Result<Json<HighRiskView>, ApiError>
where
  S: DashboardStore,
{
  let record = state
    .store
    .get_high_risk_order(&order_id)
    .await
    .map_err(store_error)?
    .ok_or_else(|| ApiError::NotFound(format!("high-risk order {order_id}")))?;
  Ok(Json(HighRiskView::from(record)))
}

/// `GET /high-risk-areas/stats/summary`
pub async fn stats<S>(State(state): State<ApiState<S>>) -> Result<Json<HighRiskStats>, ApiError>
where
  S: DashboardStore,
{
  let records = state
    .store
    .list_high_risk_orders(None)
    .await
    .map_err(store_error)?;
  Ok(Json(high_risk::high_risk_stats(&records)))
}

/// `POST /high-risk-areas`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewHighRiskOrder>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DashboardStore,
{
  let record = lifecycle::create_high_risk_order(state.store.as_ref(), body).await?;
  tracing::info!(
    order_id = %record.order_id,
    risk_rate = record.risk_rate,
    "high-risk record created"
  );
  Ok((StatusCode::CREATED, Json(HighRiskView::from(record))))
}

/// `DELETE /high-risk-areas/{order_id}`
pub async fn delete_one<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
) -> Result<Json<Ack>, ApiError>
where
  S: DashboardStore,
{
  lifecycle::delete_high_risk_order(state.store.as_ref(), &order_id).await?;
  tracing::info!(%order_id, "high-risk record deleted");
  Ok(Json(Ack::new(format!("Order {order_id} deleted successfully"))))
}

/// `PUT /high-risk-areas/{order_id}/status`
pub async fn update_status<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
  Json(body): Json<StatusBody>,
) -> Result<Json<HighRiskView>, ApiError>
where
  S: DashboardStore,
{
  let record = lifecycle::update_high_risk_status(
    state.store.as_ref(),
    &order_id,
    &body.status,
    body.message_text.as_deref(),
  )
  .await?;
  Ok(Json(HighRiskView::from(record)))
}

/// `POST /high-risk-areas/{order_id}/messages`
pub async fn add_message<S>(
  State(state): State<ApiState<S>>,
  Path(order_id): Path<String>,
  Json(body): Json<MessageBody>,
) -> Result<Json<HighRiskView>, ApiError>
where
  S: DashboardStore,
{
  let sender = body.sender.as_deref().map(lifecycle::parse_sender).transpose()?;
  let record =
    lifecycle::add_high_risk_message(state.store.as_ref(), &order_id, &body.message_text, sender)
      .await?;
  Ok(Json(HighRiskView::from(record)))
}
