//! Core traits: Job, JobDyn, and the closure-backed FnJob.

use std::marker::PhantomData;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::JobError;
use crate::session::Session;

/// Strongly-typed job trait. Implement this (or use `#[job]`) for your jobs.
///
/// The blanket impl of [`JobDyn`] deserializes the raw argument map into
/// [`Job::Args`] and serializes [`Job::Output`] back to JSON, so job bodies
/// work with concrete Rust types.
///
/// # Example
///
/// ```
/// use sauron_types::*;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, schemars::JsonSchema)]
/// struct CompareArgs { lower: i64, greater: i64 }
///
/// struct Compare;
/// impl Job for Compare {
///     type Args = CompareArgs;
///     type Output = bool;
///     type Error = std::convert::Infallible;
///
///     fn name(&self) -> &str { "compare" }
///     fn call(&self, _session: &mut Session, args: CompareArgs) -> Result<bool, Self::Error> {
///         Ok(args.lower < args.greater)
///     }
/// }
///
/// let mut session = Session::new();
/// let out = Compare
///     .call_dyn(&mut session, serde_json::json!({"lower": 1, "greater": 2}).as_object().unwrap().clone())
///     .unwrap();
/// assert_eq!(out, serde_json::json!(true));
/// ```
pub trait Job: Send + Sync {
    /// The deserialized argument type. Its JSON Schema drives parameter metadata.
    type Args: DeserializeOwned + JsonSchema;
    /// The serializable return type.
    type Output: Serialize;
    /// The job-specific error type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The unique name the job is registered under.
    fn name(&self) -> &str;

    /// Documentation for exports.
    fn doc(&self) -> Option<&str> {
        None
    }

    /// Run the job against the session.
    fn call(&self, session: &mut Session, args: Self::Args) -> Result<Self::Output, Self::Error>;
}

/// Type-erased job for dynamic dispatch. Blanket-implemented for all [`Job`] impls.
///
/// This is what the registry stores (`Arc<dyn JobDyn>`).
pub trait JobDyn: Send + Sync {
    /// The job's unique name.
    fn name(&self) -> &str;
    /// Documentation string, if any.
    fn doc(&self) -> Option<&str>;
    /// JSON Schema of the argument type, or `Null` when it cannot be rendered.
    fn args_schema(&self) -> Value;
    /// Run the job with a raw argument map, returning its output as JSON.
    fn call_dyn(&self, session: &mut Session, args: Map<String, Value>) -> Result<Value, JobError>;
}

/// Blanket implementation: any `Job` automatically becomes a `JobDyn`.
///
/// Handles:
/// - Deserializing the argument map into `T::Args`
/// - Calling `T::call(session, args)`
/// - Serializing `T::Output` into a JSON value
/// - Mapping `T::Error` into `JobError::ExecutionFailed`
impl<T: Job> JobDyn for T {
    fn name(&self) -> &str {
        Job::name(self)
    }

    fn doc(&self) -> Option<&str> {
        Job::doc(self)
    }

    fn args_schema(&self) -> Value {
        match serde_json::to_value(schemars::schema_for!(T::Args)) {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!(job = %Job::name(self), error = %e, "sauron.job.schema_error");
                Value::Null
            }
        }
    }

    fn call_dyn(&self, session: &mut Session, args: Map<String, Value>) -> Result<Value, JobError> {
        let args: T::Args = serde_json::from_value(Value::Object(args))
            .map_err(|e| JobError::InvalidArguments(e.to_string()))?;

        let output = self
            .call(session, args)
            .map_err(|e| JobError::ExecutionFailed(Box::new(e)))?;

        serde_json::to_value(&output).map_err(|e| JobError::Output(e.to_string()))
    }
}

/// Argument type for jobs that take nothing but the session.
#[derive(Debug, Clone, Copy, Default, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct NoArgs {}

/// A job backed by a closure, for registration without `#[job]`.
///
/// # Example
///
/// ```
/// use sauron_types::*;
///
/// let always = FnJob::new("always", |_session: &mut Session, _args: NoArgs| {
///     Ok::<_, std::convert::Infallible>(true)
/// })
/// .with_doc("Takes no argument and always returns true");
///
/// assert_eq!(JobDyn::name(&always), "always");
/// assert_eq!(JobDyn::doc(&always), Some("Takes no argument and always returns true"));
/// ```
pub struct FnJob<A, O, E, F> {
    name: String,
    doc: Option<String>,
    f: F,
    _marker: PhantomData<fn(A) -> Result<O, E>>,
}

impl<A, O, E, F> FnJob<A, O, E, F>
where
    F: Fn(&mut Session, A) -> Result<O, E> + Send + Sync,
{
    /// Wrap a closure under the given name.
    #[must_use]
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            doc: None,
            f,
            _marker: PhantomData,
        }
    }

    /// Attach a documentation string.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

impl<A, O, E, F> Job for FnJob<A, O, E, F>
where
    A: DeserializeOwned + JsonSchema,
    O: Serialize,
    E: std::error::Error + Send + Sync + 'static,
    F: Fn(&mut Session, A) -> Result<O, E> + Send + Sync,
{
    type Args = A;
    type Output = O;
    type Error = E;

    fn name(&self) -> &str {
        &self.name
    }

    fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    fn call(&self, session: &mut Session, args: A) -> Result<O, E> {
        (self.f)(session, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, JsonSchema)]
    struct AddArgs {
        a: i64,
        b: i64,
    }

    #[derive(Debug, thiserror::Error)]
    #[error("negative result")]
    struct Negative;

    fn add_job() -> impl JobDyn {
        FnJob::new("add", |session: &mut Session, args: AddArgs| {
            let sum = args.a + args.b;
            session.insert("sum", sum);
            if sum < 0 { Err(Negative) } else { Ok(sum) }
        })
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn call_dyn_deserializes_and_serializes() {
        let job = add_job();
        let mut session = Session::new();
        let out = job.call_dyn(&mut session, args(json!({"a": 2, "b": 3}))).unwrap();
        assert_eq!(out, json!(5));
        assert_eq!(session.get("sum"), Some(&json!(5)));
    }

    #[test]
    fn call_dyn_maps_bad_input_to_invalid_arguments() {
        let job = add_job();
        let mut session = Session::new();
        let err = job
            .call_dyn(&mut session, args(json!({"a": "two", "b": 3})))
            .unwrap_err();
        assert!(matches!(err, JobError::InvalidArguments(_)));
        assert!(session.get("sum").is_none());
    }

    #[test]
    fn call_dyn_maps_job_error_to_execution_failed() {
        let job = add_job();
        let mut session = Session::new();
        let err = job
            .call_dyn(&mut session, args(json!({"a": -5, "b": 3})))
            .unwrap_err();
        assert!(matches!(err, JobError::ExecutionFailed(_)));
        assert_eq!(err.to_string(), "execution failed: negative result");
    }

    #[test]
    fn args_schema_lists_properties() {
        let schema = add_job().args_schema();
        assert_eq!(schema["type"], "object");
        assert!(schema["properties"]["a"].is_object());
        assert_eq!(schema["required"], json!(["a", "b"]));
    }

    #[test]
    fn no_args_accepts_empty_map_only() {
        let job = FnJob::new("noop", |_: &mut Session, _: NoArgs| {
            Ok::<_, std::convert::Infallible>(())
        });
        let mut session = Session::new();
        assert_eq!(job.call_dyn(&mut session, Map::new()).unwrap(), Value::Null);
        assert!(job.call_dyn(&mut session, args(json!({"x": 1}))).is_err());
    }
}
