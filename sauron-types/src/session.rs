//! The session: a string-keyed context shared by every job of a run.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The one reserved session key. Holds the ordered log of job results.
pub const RESULTS_KEY: &str = "results";

/// One entry of the session's results log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobResult {
    /// Name of the job that ran.
    pub job: String,
    /// The value the job returned, serialized to JSON.
    #[serde(rename = "return")]
    pub output: Value,
}

/// Mutable context threaded through every job call of a run.
///
/// User data lives in an insertion-ordered string-keyed map. The results log
/// is kept as its own ordered structure and appears under [`RESULTS_KEY`]
/// when the session is serialized; writes to that key through
/// [`Session::insert`] are rejected.
///
/// # Example
///
/// ```
/// use sauron_types::Session;
///
/// let mut session = Session::new();
/// session.insert("lower_number", 3);
/// assert_eq!(session.get_as::<i64>("lower_number"), Some(3));
/// assert!(session.results().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    results: Vec<JobResult>,
    #[serde(flatten)]
    values: Map<String, Value>,
}

impl Session {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session seeded with caller-provided context.
    ///
    /// A well-formed `results` entry becomes the results log, so a session
    /// rendered with [`Session::to_value`] rebuilds with its history intact.
    /// A malformed one is dropped with a warning.
    #[must_use]
    pub fn from_context(mut context: Map<String, Value>) -> Self {
        let results = match context.remove(RESULTS_KEY) {
            None => Vec::new(),
            Some(log) => serde_json::from_value(log).unwrap_or_else(|e| {
                tracing::warn!(key = RESULTS_KEY, error = %e, "sauron.session.reserved_key");
                Vec::new()
            }),
        };
        Self {
            results,
            values: context,
        }
    }

    /// Look up a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Look up a value and deserialize it into `T`.
    ///
    /// Returns `None` when the key is absent or the value has a different shape.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Store a value, returning the previous one.
    ///
    /// The reserved [`RESULTS_KEY`] is never written; such calls return `None`
    /// and leave the session unchanged.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        if key == RESULTS_KEY {
            tracing::warn!(key = RESULTS_KEY, "sauron.session.reserved_key");
            return None;
        }
        self.values.insert(key, value.into())
    }

    /// Remove a value by key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Whether a user key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// User keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The user data, without the results log.
    #[must_use]
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// The results log, in execution order.
    #[must_use]
    pub fn results(&self) -> &[JobResult] {
        &self.results
    }

    /// The most recent entry of the results log.
    #[must_use]
    pub fn last_result(&self) -> Option<&JobResult> {
        self.results.last()
    }

    /// Append an entry to the results log.
    pub fn record_result(&mut self, job: impl Into<String>, output: Value) {
        self.results.push(JobResult {
            job: job.into(),
            output,
        });
    }

    /// Empty the results log, keeping user data.
    pub fn clear_results(&mut self) {
        self.results.clear();
    }

    /// Render the whole session as a JSON object, results log included.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut map = self.values.clone();
        let results = self
            .results
            .iter()
            .map(|r| {
                let mut entry = Map::new();
                entry.insert("job".into(), Value::String(r.job.clone()));
                entry.insert("return".into(), r.output.clone());
                Value::Object(entry)
            })
            .collect();
        map.insert(RESULTS_KEY.into(), Value::Array(results));
        Value::Object(map)
    }
}

impl From<Map<String, Value>> for Session {
    fn from(context: Map<String, Value>) -> Self {
        Self::from_context(context)
    }
}
