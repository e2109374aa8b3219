// storefront/src/pipeline/definition.rs

//! The `Pipeline<TData>` struct: an ordered list of named steps, each with one
//! or more async handlers.

use crate::error::ShopError;
use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::PipelineControl;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A step handler. It owns a clone of the run's `ContextData<TData>` and resolves
/// to a control signal or a `ShopError`.
pub type Handler<TData> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, ShopError>> + Send>>
    + Send
    + Sync,
>;

pub struct Pipeline<TData>
where
  TData: 'static + Send + Sync,
{
  /// Used as a span field so runs of different flows can be told apart in logs.
  pub(crate) name: &'static str,
  pub(crate) steps: Vec<String>,
  pub(crate) handlers: HashMap<String, Vec<Handler<TData>>>,
}

impl<TData> Pipeline<TData>
where
  TData: 'static + Send + Sync,
{
  pub fn new(name: &'static str, step_names: &[&str]) -> Self {
    Self {
      name,
      steps: step_names.iter().map(|s| (*s).to_string()).collect(),
      handlers: HashMap::new(),
    }
  }

  /// Panics when the step is unknown: a typo in a step name is a setup bug,
  /// not a runtime condition.
  fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s == step_name) {
      panic!(
        "Pipeline '{}' setup error: step '{}' not found in pipeline definition.",
        self.name, step_name
      );
    }
  }

  /// Registers a handler for `step_name`. Handlers of one step run in
  /// registration order.
  pub fn on_step<F>(&mut self, step_name: &str, handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static)
  where
    F: Future<Output = Result<PipelineControl, ShopError>> + Send + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler: Handler<TData> = Box::new(move |ctx_data| Box::pin(handler_fn(ctx_data)));
    self.handlers.entry(step_name.to_string()).or_default().push(handler);
  }
}
