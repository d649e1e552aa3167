//! Bearer-token authentication.
//!
//! Passwords are stored as argon2 PHC strings. Successful logins receive an
//! HS256 token whose `sub` claim is the user id; everything downstream only
//! sees that id.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/api/v1/auth/signup` | 409 on a duplicate email |
//! | `POST` | `/api/v1/auth/login` | 401 on bad credentials |
//! | `GET`  | `/api/v1/auth/verify` | Bearer token required; 404 for an unknown user |

use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use axum::{
  Json,
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, StatusCode, header, request::Parts},
  middleware::Next,
  response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use cod_api::ApiError;
use cod_core::{
  store::{DashboardStore, store_error},
  user::User,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  error::{Error, Result},
};

// ─── Settings ────────────────────────────────────────────────────────────────

/// `[auth]` section of the server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
  pub jwt_secret:      String,
  #[serde(default = "default_ttl_hours")]
  pub token_ttl_hours: i64,
  /// Guard every dashboard route with a bearer token.
  #[serde(default)]
  pub require_token:   bool,
}

fn default_ttl_hours() -> i64 { 24 }

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String,
  pub iat: usize,
  pub exp: usize,
}

/// Issues and verifies HS256 bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer {
  encoding: EncodingKey,
  decoding: DecodingKey,
  ttl:      Duration,
}

impl TokenIssuer {
  pub fn new(settings: &AuthSettings) -> Self {
    Self {
      encoding: EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
      decoding: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
      ttl:      Duration::hours(settings.token_ttl_hours),
    }
  }

  pub fn issue(&self, user_id: Uuid) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
      sub: user_id.to_string(),
      iat: now.timestamp().max(0) as usize,
      exp: (now + self.ttl).timestamp().max(0) as usize,
    };
    Ok(jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
  }

  /// Resolve a token to the user id it was issued for.
  pub fn verify(&self, token: &str) -> Result<Uuid> {
    let data =
      jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
        .map_err(|e| {
          tracing::debug!("token rejected: {e}");
          Error::Unauthorized
        })?;
    data.claims.sub.parse().map_err(|_| Error::Unauthorized)
  }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthorized)
}

// ─── Passwords ───────────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// `false` for a wrong password or an unparseable hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .map(|parsed| {
      Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
    })
    .unwrap_or(false)
}

// ─── Extractor / middleware ──────────────────────────────────────────────────

/// The id of the user behind a valid bearer token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl<S> FromRequestParts<AppState<S>> for AuthUser
where
  S: DashboardStore,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers)?;
    state.tokens.verify(token).map(AuthUser)
  }
}

/// Rejects requests without a valid bearer token.
pub async fn require_token(
  State(tokens): State<Arc<TokenIssuer>>,
  mut request: Request,
  next: Next,
) -> Result<Response, Error> {
  let user_id = tokens.verify(bearer_token(request.headers())?)?;
  request.extensions_mut().insert(AuthUser(user_id));
  Ok(next.run(request).await)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct UserProfile {
  pub user_id: Uuid,
  pub email:   String,
  pub name:    String,
  pub role:    String,
}

impl From<User> for UserProfile {
  fn from(user: User) -> Self {
    Self {
      user_id: user.user_id,
      email:   user.email,
      name:    user.name,
      role:    user.role,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
  pub email:    String,
  pub password: String,
  pub name:     String,
  #[serde(default)]
  pub role:     Option<String>,
}

/// `POST /api/v1/auth/signup`
pub async fn signup<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignupRequest>,
) -> Result<impl IntoResponse>
where
  S: DashboardStore,
{
  if !body.email.contains('@') {
    return Err(ApiError::BadRequest(format!("invalid email: {:?}", body.email)).into());
  }
  if body.password.is_empty() {
    return Err(ApiError::BadRequest("password must not be empty".into()).into());
  }

  let mut user = User::new(body.email, body.name, hash_password(&body.password)?);
  if let Some(role) = body.role.filter(|r| !r.trim().is_empty()) {
    user.role = role;
  }
  let user = state.store.insert_user(user).await.map_err(store_error)?;
  tracing::info!(user_id = %user.user_id, email = %user.email, "user signed up");

  Ok((StatusCode::CREATED, Json(UserProfile::from(user))))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token:   String,
  pub user_id: Uuid,
  pub email:   String,
  pub name:    String,
}

/// `POST /api/v1/auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>>
where
  S: DashboardStore,
{
  let user = state
    .store
    .get_user_by_email(&body.email)
    .await
    .map_err(store_error)?;

  let Some(user) = user.filter(|u| verify_password(&body.password, &u.password_hash)) else {
    tracing::warn!(email = %body.email, "login rejected");
    return Err(Error::BadCredentials);
  };

  let token = state.tokens.issue(user.user_id)?;
  tracing::info!(user_id = %user.user_id, "login succeeded");
  Ok(Json(LoginResponse {
    token,
    user_id: user.user_id,
    email: user.email,
    name: user.name,
  }))
}

/// `GET /api/v1/auth/verify`
pub async fn verify<S>(
  State(state): State<AppState<S>>,
  AuthUser(user_id): AuthUser,
) -> Result<Json<UserProfile>>
where
  S: DashboardStore,
{
  let user = state
    .store
    .get_user(user_id)
    .await
    .map_err(store_error)?
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id}")))?;
  Ok(Json(UserProfile::from(user)))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn issuer(ttl_hours: i64) -> TokenIssuer {
    TokenIssuer::new(&AuthSettings {
      jwt_secret:      "test-secret".to_string(),
      token_ttl_hours: ttl_hours,
      require_token:   false,
    })
  }

  #[test]
  fn issued_token_resolves_to_user() {
    let tokens = issuer(24);
    let user_id = Uuid::new_v4();
    let token = tokens.issue(user_id).unwrap();
    assert_eq!(tokens.verify(&token).unwrap(), user_id);
  }

  #[test]
  fn expired_token_is_rejected() {
    let tokens = issuer(-2);
    let token = tokens.issue(Uuid::new_v4()).unwrap();
    assert!(matches!(tokens.verify(&token), Err(Error::Unauthorized)));
  }

  #[test]
  fn foreign_secret_is_rejected() {
    let token = issuer(24).issue(Uuid::new_v4()).unwrap();
    let other = TokenIssuer::new(&AuthSettings {
      jwt_secret:      "another-secret".to_string(),
      token_ttl_hours: 24,
      require_token:   false,
    });
    assert!(matches!(other.verify(&token), Err(Error::Unauthorized)));
    assert!(matches!(other.verify("not-a-token"), Err(Error::Unauthorized)));
  }

  #[test]
  fn password_round_trip() {
    let hash = hash_password("hunter2").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
    assert!(!verify_password("hunter2", "not a phc string"));
  }

  #[test]
  fn bearer_header_parsing() {
    let mut headers = HeaderMap::new();
    assert!(bearer_token(&headers).is_err());
    headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
    assert!(bearer_token(&headers).is_err());
    headers.insert(header::AUTHORIZATION, "Bearer abc.def".parse().unwrap());
    assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
  }
}
