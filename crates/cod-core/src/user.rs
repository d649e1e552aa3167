//! Dashboard operators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_ROLE: &str = "user";

/// A registered operator. Emails are unique across users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
  pub user_id:       Uuid,
  pub email:         String,
  pub name:          String,
  pub role:          String,
  /// PHC-format password hash. Never serialised.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub created_at:    DateTime<Utc>,
}

impl User {
  pub fn new(email: impl Into<String>, name: impl Into<String>, password_hash: String) -> Self {
    Self {
      user_id: Uuid::new_v4(),
      email: email.into().trim().to_lowercase(),
      name: name.into(),
      role: DEFAULT_ROLE.to_owned(),
      password_hash,
      created_at: Utc::now(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_is_never_serialised() {
    let user = User::new(" Ops@Example.com ", "Ops", "$argon2id$v=19$...".into());
    assert_eq!(user.email, "ops@example.com");
    assert_eq!(user.role, DEFAULT_ROLE);
    let json = serde_json::to_value(&user).unwrap();
    assert!(json.get("password_hash").is_none());
  }
}
