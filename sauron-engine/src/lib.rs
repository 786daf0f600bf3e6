//! Rule engine for sauron.
//!
//! This crate provides:
//! - [`Registry`]: register jobs and look them up by name
//! - [`metadata`]: derive parameter metadata from a job's argument schema
//! - [`executor`]: bind arguments, call jobs, and short-circuit on falsy results
//! - [`RuleParser`] / [`DefaultParser`]: turn raw rules into ordered job invocations
//! - [`Exporter`] / [`DefaultExporter`]: serialize registry metadata
//! - [`Engine`]: the facade tying them together around a carried session

pub mod config;
pub mod engine;
pub mod executor;
pub mod exporter;
pub mod metadata;
pub mod parser;
pub mod registry;

pub use config::*;
pub use engine::*;
pub use executor::{bind_and_call, is_successful};
pub use exporter::*;
pub use parser::*;
pub use registry::*;

#[cfg(feature = "macros")]
pub use sauron_job_macros::job;
