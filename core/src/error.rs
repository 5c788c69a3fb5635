// grocer/src/error.rs
use crate::pipeline::PipelineError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// One offending cart line in a rejected checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockIssue {
  pub product_id: Uuid,
  pub requested: u32,
  /// `None` when the product does not exist.
  pub available: Option<u32>,
  pub message: String,
}

impl StockIssue {
  pub fn missing(product_id: Uuid, label: &str, requested: u32) -> Self {
    Self {
      product_id,
      requested,
      available: None,
      message: format!("Product \"{}\" not found", label),
    }
  }

  pub fn insufficient(product_id: Uuid, name: &str, available: u32, requested: u32) -> Self {
    Self {
      product_id,
      requested,
      available: Some(available),
      message: format!(
        "Insufficient stock for \"{}\". Available: {}, Requested: {}",
        name, available, requested
      ),
    }
  }
}

fn join_issues(issues: &[StockIssue]) -> String {
  issues.iter().map(|i| i.message.as_str()).collect::<Vec<_>>().join("; ")
}

#[derive(Debug, Error)]
pub enum GrocerError {
  /// Missing or malformed input.
  #[error("{0}")]
  Validation(String),

  /// Insufficient or absent inventory, aggregated across every offending line.
  #[error("Cannot place order: {}", join_issues(.issues))]
  Stock { issues: Vec<StockIssue> },

  #[error("{entity} not found")]
  NotFound { entity: &'static str, id: String },

  /// The caller is neither the owner of the record nor an admin.
  #[error("{0}")]
  Unauthorized(String),

  /// An illegal state transition, e.g. delivering a cancelled order.
  #[error("{0}")]
  Conflict(String),

  #[error("Storage failure: {source}")]
  Storage {
    #[source]
    source: anyhow::Error,
  },

  #[error(transparent)]
  Pipeline(#[from] PipelineError),

  #[error("Internal error: {0}")]
  Internal(String),
}

impl GrocerError {
  pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
    GrocerError::NotFound {
      entity,
      id: id.to_string(),
    }
  }

  pub fn storage(source: impl Into<anyhow::Error>) -> Self {
    GrocerError::Storage { source: source.into() }
  }

  /// True for failures caused by the request rather than by the system.
  pub fn is_client_error(&self) -> bool {
    matches!(
      self,
      GrocerError::Validation(_)
        | GrocerError::Stock { .. }
        | GrocerError::NotFound { .. }
        | GrocerError::Unauthorized(_)
        | GrocerError::Conflict(_)
    )
  }
}

pub type GrocerResult<T, E = GrocerError> = std::result::Result<T, E>;
