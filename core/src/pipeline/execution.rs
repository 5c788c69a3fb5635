// grocer/src/pipeline/execution.rs

//! `Pipeline::run()`: executes steps in order and unwinds compensators on failure.

use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::{PipelineControl, PipelineResult};
use crate::pipeline::definition::Pipeline;
use crate::pipeline::error::PipelineError;
use tracing::{event, info_span, instrument, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Executes the pipeline against `ctx_data`.
  ///
  /// On the first handler error, the compensators of the failing step and of
  /// every previously completed step run in reverse order, then the handler's
  /// error is returned. Compensator failures are logged and never replace the
  /// original error.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = %self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");
    let mut entered: Vec<&str> = Vec::with_capacity(self.steps.len());

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();

      if let Some(skip_if) = &step_def.skip_if {
        let skip = ctx_data.with(|data| skip_if(data));
        if skip {
          event!(Level::DEBUG, step = step_name, "Step skipped by its skip condition.");
          continue;
        }
      }

      let handlers = match self.on.get(step_name).filter(|h| !h.is_empty()) {
        Some(handlers) => handlers,
        None if step_def.optional => {
          event!(Level::DEBUG, step = step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        None => {
          event!(Level::ERROR, step = step_name, "Non-optional step has no handlers.");
          self.unwind(&entered, &ctx_data).await;
          return Err(Err::from(PipelineError::HandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }
      };

      entered.push(step_name);
      let step_span = info_span!("pipeline_step", step = step_name, step_index = step_idx);

      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        let outcome = handler_fn(ctx_data.clone()).instrument(step_span.clone()).await;
        match outcome {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => {
            event!(Level::INFO, step = step_name, handler_idx, "Pipeline stopped by a handler.");
            return Ok(PipelineResult::Stopped);
          }
          Err(e) => {
            event!(Level::WARN, step = step_name, handler_idx, error = %e, "Step handler failed, unwinding.");
            self.unwind(&entered, &ctx_data).await;
            return Err(e);
          }
        }
      }
      event!(Level::DEBUG, step = step_name, "Step finished.");
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  async fn unwind(&self, entered: &[&str], ctx_data: &ContextData<TData>) {
    for step_name in entered.iter().rev() {
      let Some(compensators) = self.compensate.get(*step_name) else {
        continue;
      };
      let span = info_span!("pipeline_compensation", step = *step_name);
      for compensator in compensators.iter().rev() {
        if let Err(e) = compensator(ctx_data.clone()).instrument(span.clone()).await {
          event!(Level::ERROR, step = *step_name, error = %e, "Compensation failed.");
        }
      }
    }
  }
}
