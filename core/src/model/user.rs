// grocer/src/model/user.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Profile data owned by the external user service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  pub address: Option<String>,
  pub is_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Admin,
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Role::User => "user",
      Role::Admin => "admin",
    })
  }
}

impl FromStr for Role {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "user" => Ok(Role::User),
      "admin" => Ok(Role::Admin),
      other => Err(format!("unknown role '{}'", other)),
    }
  }
}

/// The identity on whose behalf an operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
  pub user_id: Uuid,
  pub role: Role,
}

impl Caller {
  pub fn user(user_id: Uuid) -> Self {
    Self { user_id, role: Role::User }
  }

  pub fn admin(user_id: Uuid) -> Self {
    Self { user_id, role: Role::Admin }
  }

  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }

  /// Owners and admins may act on a record.
  pub fn may_access(&self, owner: Uuid) -> bool {
    self.is_admin() || self.user_id == owner
  }
}
