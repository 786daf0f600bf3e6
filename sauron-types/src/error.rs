//! Error types for all sauron crates.

/// Errors from a single job call.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The argument map could not be turned into the job's argument type.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// The job itself failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    /// The job's return value could not be serialized.
    #[error("output serialization failed: {0}")]
    Output(String),
}

/// Errors surfaced by the engine to the caller of `run`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A rule references a job that was never registered.
    #[error("unknown job: {0}")]
    UnknownJob(String),
    /// The raw rule could not be resolved into an ordered job sequence.
    #[error("parse error: {0}")]
    Parse(String),
    /// A provided argument could not be bound to the job's declared parameters.
    #[error("cannot bind arguments for job '{job}': {reason}")]
    ArgumentBinding {
        /// Name of the job being called.
        job: String,
        /// What went wrong.
        reason: String,
    },
    /// An action declared session keys that are absent at call time.
    #[error("job '{job}' requires session keys that are missing: {}", .missing.join(", "))]
    MissingSessionKeys {
        /// Name of the job being called.
        job: String,
        /// The absent keys, in declaration order.
        missing: Vec<String>,
    },
    /// The job ran and returned an error.
    #[error("job '{job}' failed: {source}")]
    JobFailed {
        /// Name of the job that failed.
        job: String,
        /// The underlying job error.
        #[source]
        source: JobError,
    },
    /// The requested export format is not supported by the exporter.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),
    /// Serializing the registry metadata failed.
    #[error("export failed: {0}")]
    Export(String),
}

impl EngineError {
    /// Whether this error was raised before any job of the rule ran.
    ///
    /// Parse failures abort a run up front; every other kind is raised while
    /// walking the job sequence, so earlier entries may already be recorded
    /// in the session.
    #[must_use]
    pub fn is_pre_execution(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// The job name this error is attributed to, if any.
    #[must_use]
    pub fn job(&self) -> Option<&str> {
        match self {
            Self::UnknownJob(job)
            | Self::ArgumentBinding { job, .. }
            | Self::MissingSessionKeys { job, .. }
            | Self::JobFailed { job, .. } => Some(job),
            Self::Parse(_) | Self::UnsupportedFormat(_) | Self::Export(_) => None,
        }
    }
}
