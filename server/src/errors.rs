// grocer_server/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use grocer::GrocerError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Domain(#[from] GrocerError),

  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migrate(#[from] sqlx::migrate::MigrateError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Domain(err) => match err {
        GrocerError::Validation(_) | GrocerError::Stock { .. } | GrocerError::Conflict(_) => StatusCode::BAD_REQUEST,
        GrocerError::NotFound { .. } => StatusCode::NOT_FOUND,
        GrocerError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        GrocerError::Storage { .. } | GrocerError::Pipeline(_) | GrocerError::Internal(_) => {
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Config(_) | AppError::Sqlx(_) | AppError::Migrate(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Rejecting request");
    }

    let body = match self {
      AppError::Domain(GrocerError::Stock { issues }) => json!({"error": self.to_string(), "issues": issues}),
      AppError::Domain(err) if err.is_client_error() => json!({"error": err.to_string()}),
      AppError::Domain(GrocerError::Storage { .. }) | AppError::Sqlx(_) | AppError::Migrate(_) => {
        json!({"error": "Database operation failed"})
      }
      AppError::Validation(m) | AppError::Auth(m) => json!({"error": m}),
      _ => json!({"error": "An internal error occurred"}),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
