// grocer/src/pipeline/error.rs
use thiserror::Error;

/// Failures raised by the pipeline runtime itself rather than by handlers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  /// A handler expected an earlier step to have populated part of the context.
  #[error("Step '{step_name}' found the pipeline context incomplete: {detail}")]
  ContextIncomplete { step_name: String, detail: String },
}
