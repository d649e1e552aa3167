//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0} not found")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  #[error("{0} already exists")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<cod_core::Error> for ApiError {
  fn from(err: cod_core::Error) -> Self {
    match err {
      cod_core::Error::NotFound(what) => Self::NotFound(what),
      cod_core::Error::InvalidArgument(msg) => Self::BadRequest(msg),
      cod_core::Error::DuplicateKey(what) => Self::Conflict(what),
      cod_core::Error::Store(e) => Self::Internal(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        return (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "Internal server error" })),
        )
          .into_response();
      }
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn core_errors_map_to_statuses() {
    let cases = [
      (cod_core::Error::NotFound("order ORD-1".into()), StatusCode::NOT_FOUND),
      (cod_core::Error::InvalidArgument("bad".into()), StatusCode::BAD_REQUEST),
      (cod_core::Error::DuplicateKey("order ORD-1".into()), StatusCode::CONFLICT),
      (
        cod_core::Error::Store("disk full".into()),
        StatusCode::INTERNAL_SERVER_ERROR,
      ),
    ];
    for (err, want) in cases {
      assert_eq!(ApiError::from(err).into_response().status(), want);
    }
  }
}
