// storefront/src/pipeline/mod.rs

//! A small named-step pipeline used to express the multi-step business flows
//! (checkout, registration) as an ordered list of async handlers over a shared
//! `ContextData<T>`.

pub mod context_data;
pub mod control;
pub mod definition;
pub mod execution;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use definition::{Handler, Pipeline};
