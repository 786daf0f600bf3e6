//! Core data model for the sauron rule engine.
//!
//! This crate provides:
//! - [`Session`]: the mutable context threaded through every job of a run
//! - [`Job`] / [`JobDyn`]: strongly-typed and type-erased job traits
//! - [`ParamMetadata`] / [`ParamKind`]: the tagged description of job parameters
//! - [`Rule`] / [`JobInvocation`] / [`RawRule`]: what the parser produces and consumes
//! - [`EngineError`] / [`JobError`]: the error taxonomy

pub mod error;
pub mod session;
pub mod traits;
pub mod types;

pub use error::*;
pub use session::*;
pub use traits::*;
pub use types::*;
