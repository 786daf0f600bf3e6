//! Job registry: register, look up, and enumerate jobs.

use std::collections::HashMap;
use std::sync::Arc;

use sauron_types::{EngineError, JobCategory, JobDyn, JobMetadata, ParamMetadata};

use crate::metadata;

/// How a job should be registered: category, label, and session contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Category tag.
    pub category: JobCategory,
    /// Human-readable label. Defaults to the job name.
    pub label: Option<String>,
    /// Session keys the job expects to be populated before it runs.
    pub requires_session_keys: Vec<String>,
}

impl Registration {
    /// Register as a condition.
    #[must_use]
    pub fn condition() -> Self {
        Self {
            category: JobCategory::Condition,
            ..Self::default()
        }
    }

    /// Register as an action.
    #[must_use]
    pub fn action() -> Self {
        Self {
            category: JobCategory::Action,
            ..Self::default()
        }
    }

    /// Register as a generic job.
    #[must_use]
    pub fn job() -> Self {
        Self::default()
    }

    /// Set the human-readable label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Declare session keys the job expects. Duplicates are dropped, order kept.
    #[must_use]
    pub fn requiring<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for key in keys {
            let key = key.into();
            if !self.requires_session_keys.contains(&key) {
                self.requires_session_keys.push(key);
            }
        }
        self
    }
}

/// Opaque handle returned by registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle {
    name: String,
}

impl JobHandle {
    /// The registered job name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A registered job with its derived metadata.
#[derive(Clone)]
pub struct JobRecord {
    label: String,
    category: JobCategory,
    job: Arc<dyn JobDyn>,
    metadata: JobMetadata,
    requires_session_keys: Vec<String>,
}

impl JobRecord {
    fn new(job: Arc<dyn JobDyn>, registration: Registration) -> Self {
        let metadata = metadata::extract(job.as_ref());
        Self {
            label: registration
                .label
                .unwrap_or_else(|| metadata.name.clone()),
            category: registration.category,
            job,
            metadata,
            requires_session_keys: registration.requires_session_keys,
        }
    }

    /// The unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// The human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The category tag.
    #[must_use]
    pub fn category(&self) -> JobCategory {
        self.category
    }

    /// The callable.
    #[must_use]
    pub fn job(&self) -> &dyn JobDyn {
        self.job.as_ref()
    }

    /// Everything derived by inspection: name, doc, and parameters.
    #[must_use]
    pub fn metadata(&self) -> &JobMetadata {
        &self.metadata
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamMetadata] {
        &self.metadata.params
    }

    /// Look up one parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamMetadata> {
        self.metadata.param(name)
    }

    /// Session keys the job expects to be populated.
    #[must_use]
    pub fn requires_session_keys(&self) -> &[String] {
        &self.requires_session_keys
    }
}

impl std::fmt::Debug for JobRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobRecord")
            .field("name", &self.name())
            .field("label", &self.label)
            .field("category", &self.category)
            .field("params", &self.metadata.params)
            .field("requires_session_keys", &self.requires_session_keys)
            .finish_non_exhaustive()
    }
}

/// Insertion-ordered registry of jobs.
///
/// Registering a name twice replaces the earlier record (last write wins)
/// while keeping its original position in enumeration order. Order never
/// affects execution; that comes from the rule.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    records: Vec<JobRecord>,
    index: HashMap<String, usize>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job (auto-erased to `JobDyn`).
    pub fn register<J: JobDyn + 'static>(&mut self, job: J, registration: Registration) -> JobHandle {
        self.register_dyn(Arc::new(job), registration)
    }

    /// Register a pre-erased job.
    pub fn register_dyn(&mut self, job: Arc<dyn JobDyn>, registration: Registration) -> JobHandle {
        let record = JobRecord::new(job, registration);
        let name = record.name().to_string();

        match self.index.get(&name) {
            Some(&slot) => {
                tracing::debug!(job = %name, "sauron.job.overwrite");
                self.records[slot] = record;
            }
            None => {
                tracing::debug!(
                    job = %name,
                    category = %record.category,
                    params = record.params().len(),
                    "sauron.job.register"
                );
                self.index.insert(name.clone(), self.records.len());
                self.records.push(record);
            }
        }

        JobHandle { name }
    }

    /// Look up a job by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&JobRecord> {
        self.index.get(name).map(|&slot| &self.records[slot])
    }

    /// Look up a job by name, failing with [`EngineError::UnknownJob`].
    pub fn lookup(&self, name: &str) -> Result<&JobRecord, EngineError> {
        self.get(name)
            .ok_or_else(|| EngineError::UnknownJob(name.to_string()))
    }

    /// Whether a job is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.iter()
    }

    /// Names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(JobRecord::name)
    }

    /// Number of registered jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
