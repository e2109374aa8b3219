// tests/pipeline_tests.rs
mod common;

use common::*;
use storefront::{ContextData, Pipeline, PipelineControl, PipelineResult, ShopError};

#[tokio::test]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("ordered", &["step1", "step2", "step3"]);
  pipeline.on_step("step1", create_simple_handler("step1", " S1"));
  pipeline.on_step("step2", create_simple_handler("step2", " S2"));
  pipeline.on_step("step3", create_simple_handler("step3", " S3"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("stopping", &["stepA", "stopStep", "stepC"]);
  pipeline.on_step("stepA", create_simple_handler("stepA", "A"));
  pipeline.on_step("stopStep", |ctx: ContextData<TestContext>| async move {
    ctx.write().steps_executed.push("stopStep".to_string());
    Ok::<PipelineControl, ShopError>(PipelineControl::Stop)
  });
  pipeline.on_step("stepC", create_simple_handler("stepC", "C"));

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.counter, 1);
  assert_eq!(guard.steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
async fn test_pipeline_propagates_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("failing", &["good_step", "bad_step", "another_step"]);
  pipeline.on_step("good_step", create_simple_handler("good_step", "Good"));
  pipeline.on_step("bad_step", create_failing_handler("bad_step", "I am a bad step!"));
  pipeline.on_step("another_step", create_simple_handler("another_step", "NeverRun"));

  let ctx = ContextData::new(TestContext::default());
  match pipeline.run(ctx.clone()).await {
    Err(ShopError::Internal(msg)) => assert_eq!(msg, "I am a bad step!"),
    other => panic!("Expected ShopError::Internal, got {:?}", other),
  }

  let guard = ctx.read();
  assert_eq!(guard.message, "Good");
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
async fn test_step_without_handler_fails() {
  setup_tracing();
  let pipeline = Pipeline::<TestContext>::new("unwired", &["step_with_no_handler"]);

  let ctx = ContextData::new(TestContext::default());
  match pipeline.run(ctx).await {
    Err(ShopError::HandlerMissing { step_name }) => assert_eq!(step_name, "step_with_no_handler"),
    other => panic!("Expected HandlerMissing, got {:?}", other),
  }
}

#[tokio::test]
async fn test_handlers_of_one_step_run_in_registration_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("multi", &["main_step"]);
  pipeline.on_step("main_step", create_simple_handler("first", "First;"));
  pipeline.on_step("main_step", create_simple_handler("second", "Second;"));

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().message, "First;Second;");
}

#[tokio::test]
async fn test_stop_in_first_handler_skips_rest_of_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext>::new("multi_stop", &["main_step", "later"]);
  pipeline.on_step("main_step", create_simple_handler("first", "First;"));
  pipeline.on_step("main_step", create_simple_handler("second", "Second;"));
  pipeline.on_step("later", create_simple_handler("later", "Later;"));

  let ctx = ContextData::new(TestContext {
    should_stop_at: Some("first".to_string()),
    ..Default::default()
  });
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert_eq!(ctx.read().steps_executed, vec!["first"]);
}

#[test]
#[should_panic(expected = "step 'nope' not found")]
fn test_registering_unknown_step_panics() {
  let mut pipeline = Pipeline::<TestContext>::new("typo", &["real"]);
  pipeline.on_step("nope", create_simple_handler("nope", ""));
}

#[test]
fn test_context_data_clone_shares_data() {
  let original_ctx = ContextData::new(TestContext {
    counter: 1,
    ..Default::default()
  });
  let cloned_ctx = original_ctx.clone();

  {
    original_ctx.write().counter = 5;
  }
  assert_eq!(cloned_ctx.read().counter, 5);
}
