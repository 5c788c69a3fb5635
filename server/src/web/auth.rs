// grocer_server/src/web/auth.rs

//! Identity extractors.
//!
//! Authentication is owned by an upstream service which forwards the verified
//! identity as `X-User-ID` and `X-User-Role` headers.

use crate::errors::AppError;
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use grocer::{Caller, Role};
use tracing::warn;
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "X-User-ID";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

fn caller_from_headers(req: &HttpRequest) -> Result<Caller, AppError> {
  let user_id = req
    .headers()
    .get(USER_ID_HEADER)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| Uuid::parse_str(v.trim()).ok())
    .ok_or_else(|| {
      warn!("Missing or invalid {} header.", USER_ID_HEADER);
      AppError::Auth("Not authorized, no valid user id".to_string())
    })?;

  let role = match req.headers().get(USER_ROLE_HEADER) {
    None => Role::User,
    Some(value) => value
      .to_str()
      .ok()
      .and_then(|v| v.parse::<Role>().ok())
      .ok_or_else(|| AppError::Auth("Not authorized, invalid role".to_string()))?,
  };
  Ok(Caller { user_id, role })
}

/// Any signed-in customer or admin.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub caller: Caller,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(caller_from_headers(req).map(|caller| AuthenticatedUser { caller }))
  }
}

/// A signed-in admin; anyone else is rejected with 401.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser {
  pub caller: Caller,
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(caller_from_headers(req).and_then(|caller| {
      if caller.is_admin() {
        Ok(AdminUser { caller })
      } else {
        warn!(user_id = %caller.user_id, "Admin route requested by a non-admin.");
        Err(AppError::Auth("Not authorized as an admin".to_string()))
      }
    }))
  }
}
