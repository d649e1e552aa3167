//! Composition root for the cash-on-delivery dashboard server.
//!
//! Wires the store, the courier dispatcher, and token auth into one axum
//! [`Router`]: the dashboard API under `/api/v1`, the auth routes beside it,
//! and CORS plus request tracing around everything.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Json, Router, middleware,
  routing::{get, post},
};
use cod_api::{ApiState, CourierConfig, CourierDispatcher};
use cod_core::store::DashboardStore;
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use auth::{AuthSettings, TokenIssuer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `COD_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
  pub auth:       AuthSettings,
  #[serde(default)]
  pub couriers:   CourierConfig,
}

fn default_host() -> String { "0.0.0.0".to_string() }

fn default_port() -> u16 { 8000 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the server-level handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub couriers: Arc<CourierDispatcher>,
  pub tokens:   Arc<TokenIssuer>,
  pub config:   Arc<ServerConfig>,
}

impl<S> AppState<S> {
  pub fn new(store: Arc<S>, couriers: CourierDispatcher, config: ServerConfig) -> Self {
    Self {
      store,
      couriers: Arc::new(couriers),
      tokens: Arc::new(TokenIssuer::new(&config.auth)),
      config: Arc::new(config),
    }
  }

  fn api_state(&self) -> ApiState<S> {
    ApiState {
      store:    Arc::clone(&self.store),
      couriers: Arc::clone(&self.couriers),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      couriers: Arc::clone(&self.couriers),
      tokens:   Arc::clone(&self.tokens),
      config:   Arc::clone(&self.config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full server [`Router`].
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DashboardStore + 'static,
{
  let mut dashboard = cod_api::api_router(state.api_state());
  if state.config.auth.require_token {
    dashboard = dashboard.layer(middleware::from_fn_with_state(
      Arc::clone(&state.tokens),
      auth::require_token,
    ));
  }

  let auth_routes = Router::new()
    .route("/auth/signup", post(auth::signup::<S>))
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/verify", get(auth::verify::<S>))
    .with_state(state);

  Router::new()
    .route("/", get(root))
    .route("/health", get(health))
    .nest("/api/v1", dashboard.merge(auth_routes))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
}

async fn root() -> Json<Value> { Json(json!({ "message": "CoD App API is running" })) }

async fn health() -> Json<Value> { Json(json!({ "status": "healthy" })) }

// ─── Integration tests ────────────────────────────────────────────────────────
