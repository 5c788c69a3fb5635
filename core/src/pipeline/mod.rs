// grocer/src/pipeline/mod.rs

//! A small asynchronous step-pipeline runtime.
//!
//! Multi-step business processes (checkout being the main one) are declared as
//! an ordered list of named steps. Each step carries async handlers that
//! operate on a shared [`ContextData<T>`], and optionally compensators that
//! undo the step's recorded effects when a later step fails.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod error;
pub mod execution;
pub mod step;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Compensator, Handler, Pipeline};
pub use error::PipelineError;
pub use step::{SkipCondition, StepDef};
