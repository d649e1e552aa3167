//! Server error type and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use cod_api::ApiError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("Invalid email or password")]
  BadCredentials,

  #[error(transparent)]
  Api(#[from] ApiError),

  #[error("token error: {0}")]
  Token(#[from] jsonwebtoken::errors::Error),

  #[error("password hash error: {0}")]
  Hash(String),
}

impl From<cod_core::Error> for Error {
  fn from(err: cod_core::Error) -> Self { Self::Api(err.into()) }
}

impl From<argon2::password_hash::Error> for Error {
  fn from(err: argon2::password_hash::Error) -> Self { Self::Hash(err.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized | Error::BadCredentials => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": self.to_string() }))).into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Bearer realm=\"cod-dashboard\""),
        );
        res
      }
      Error::Api(e) => e.into_response(),
      Error::Token(e) => ApiError::Internal(Box::new(e)).into_response(),
      Error::Hash(msg) => ApiError::Internal(msg.into()).into_response(),
    }
  }
}
