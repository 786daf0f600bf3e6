#![deny(missing_docs)]
//! # sauron: umbrella crate
//!
//! A single import surface for the sauron rule engine. Register conditions
//! and actions, then run rules that call them in order against a shared
//! session until one returns a falsy value.
//!
//! ```
//! use sauron::prelude::*;
//! use serde_json::json;
//!
//! /// Checks if first number is lower than the second
//! #[job]
//! fn first_condition(
//!     session: &mut Session,
//!     #[arg(default = 10)] lower_number: i64,
//!     #[arg(default = 20)] greater_number: i64,
//! ) -> bool {
//!     session.insert("lower_number", lower_number);
//!     lower_number < greater_number
//! }
//!
//! let mut engine = Engine::new();
//! engine.register_condition(FirstConditionJob, Some("First Condition"));
//! engine
//!     .run(json!({"conditions": [{"name": "first_condition", "args": {"lower_number": 3}}]}))
//!     .unwrap();
//! assert_eq!(engine.session().results()[0].output, json!(true));
//! ```

pub use sauron_engine;
pub use sauron_types;

#[cfg(feature = "macros")]
pub use sauron_engine::job;

/// Happy-path imports for registering jobs and running rules.
pub mod prelude {
    pub use sauron_types::{
        EngineError, FnJob, Job, JobCategory, JobDyn, JobError, JobInvocation, JobResult,
        NoArgs, RawRule, Rule, Session,
    };

    pub use sauron_engine::{
        Engine, EngineBuilder, EngineConfig, ExportFormat, Exported, Registration, Registry,
        is_successful,
    };

    #[cfg(feature = "macros")]
    pub use sauron_engine::job;
}
