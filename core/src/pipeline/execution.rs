// storefront/src/pipeline/execution.rs

//! `Pipeline::run()`: executes the steps in order against one shared context.

use crate::error::ShopError;
use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::{PipelineControl, PipelineResult};
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData> Pipeline<TData>
where
  TData: 'static + Send + Sync,
{
  /// Runs every step against `ctx_data`.
  ///
  /// A step without handlers is a configuration error (`ShopError::HandlerMissing`).
  /// The first handler error aborts the run and is returned unchanged; the
  /// first `PipelineControl::Stop` ends it with `PipelineResult::Stopped`.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, ShopError> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_name) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "pipeline_step_execution",
        step_name = step_name.as_str(),
        step_index = step_idx
      );

      let handlers = match self.handlers.get(step_name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ => {
          event!(parent: &step_span, Level::ERROR, "Step has no handlers.");
          return Err(ShopError::HandlerMissing {
            step_name: step_name.clone(),
          });
        }
      };

      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        let handler_span = span!(parent: &step_span, Level::DEBUG, "step_handler", handler_index = handler_idx);
        match handler_fn(ctx_data.clone()).instrument(handler_span).await {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => {
            event!(parent: &step_span, Level::INFO, "Pipeline stopped by a handler.");
            return Ok(PipelineResult::Stopped);
          }
          Err(e) => {
            event!(parent: &step_span, Level::WARN, error = %e, "Step handler failed.");
            return Err(e);
          }
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step finished.");
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }
}
