//! Model generated aggregation pipelines.
//!
//! The flow for a single question is strictly linear:
//! [`Translator`] → [`PipelineValidator`] → [`PipelineExecutor`].
pub mod errors;
pub mod exec;
pub mod stage;
pub mod translate;
pub mod validate;

pub use bson::Document;
pub use exec::PipelineExecutor;
pub use stage::{Pipeline, Stage};
pub use translate::Translator;
pub use validate::{PipelineValidator, ValidatorConfig};
