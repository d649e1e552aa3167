//! Handlers for `/deliveries` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/deliveries` | Optional `?courier=postex\|leopard\|all` |
//! | `POST` | `/deliveries` | Body: [`NewDelivery`]; 409 on a duplicate tracking number |
//! | `GET`  | `/deliveries/stats/couriers` | Success rate per courier |
//! | `GET`  | `/deliveries/stats/cities` | Success rate per city and courier |
//! | `GET`  | `/deliveries/stats/summary` | Counts plus courier performance |
//! | `GET`  | `/deliveries/{tracking}` | 404 if not found |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use cod_core::{
  delivery::{
    self, CityStats, CourierStats, Delivery, DeliveryFilter, DeliverySummary, DeliveryView,
    NewDelivery,
  },
  lifecycle,
  store::{DashboardStore, store_error},
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

async fn all_deliveries<S: DashboardStore>(
  state: &ApiState<S>,
) -> Result<Vec<Delivery>, ApiError> {
  Ok(
    state
      .store
      .list_deliveries(&DeliveryFilter::default())
      .await
      .map_err(store_error)?,
  )
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub courier: Option<String>,
}

/// `GET /deliveries[?courier=<key>]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<DeliveryView>>, ApiError>
where
  S: DashboardStore,
{
  let filter = DeliveryFilter::courier(params.courier.as_deref());
  let deliveries = state
    .store
    .list_deliveries(&filter)
    .await
    .map_err(store_error)?;
  Ok(Json(deliveries.into_iter().map(DeliveryView::from).collect()))
}

/// `POST /deliveries`
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<NewDelivery>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DashboardStore,
{
  let created = lifecycle::create_delivery(state.store.as_ref(), body).await?;
  Ok((StatusCode::CREATED, Json(DeliveryView::from(created))))
}

/// `GET /deliveries/{tracking}`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(tracking): Path<String>,
) -> Result<Json<DeliveryView>, ApiError>
where
  S: DashboardStore,
{
  let found = state
    .store
    .get_delivery(&tracking)
    .await
    .map_err(store_error)?
    .ok_or_else(|| ApiError::NotFound(format!("delivery {tracking}")))?;
  Ok(Json(DeliveryView::from(found)))
}

// ─── Stats ───────────────────────────────────────────────────────────────────

/// `GET /deliveries/stats/couriers`
pub async fn courier_stats<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<BTreeMap<String, CourierStats>>, ApiError>
where
  S: DashboardStore,
{
  let deliveries = all_deliveries(&state).await?;
  Ok(Json(delivery::courier_stats(&deliveries)))
}

/// `GET /deliveries/stats/cities`
pub async fn city_stats<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<CityStats>>, ApiError>
where
  S: DashboardStore,
{
  let deliveries = all_deliveries(&state).await?;
  Ok(Json(delivery::city_stats(&deliveries)))
}

/// `GET /deliveries/stats/summary`
pub async fn summary<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<DeliverySummary>, ApiError>
where
  S: DashboardStore,
{
  let deliveries = all_deliveries(&state).await?;
  Ok(Json(delivery::delivery_summary(&deliveries)))
}
