//! Job metadata, rule, and invocation types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The category a job was registered under.
///
/// Categories are informational: the executor applies the same short-circuit
/// rule to every job regardless of its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    /// Gates execution; usually returns a boolean.
    Condition,
    /// Runs for its side effects once prior conditions passed.
    Action,
    /// A generic job.
    #[default]
    Job,
}

impl JobCategory {
    /// The lowercase name used in exports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Condition => "condition",
            Self::Action => "action",
            Self::Job => "job",
        }
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "condition" => Ok(Self::Condition),
            "action" => Ok(Self::Action),
            "job" => Ok(Self::Job),
            other => Err(format!("unknown job category: {other}")),
        }
    }
}

/// Tagged description of a parameter's declared type.
///
/// Produced once when a job is registered and consumed by the argument binder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamKind {
    /// A scalar or container JSON type (`integer`, `string`, `array`, ...).
    Primitive {
        /// The JSON type name.
        type_name: String,
    },
    /// A closed set of string labels.
    Enumeration {
        /// Name of the enumeration type.
        type_name: String,
        /// Legal labels, in declaration order.
        choices: Vec<String>,
    },
    /// A composite record type built from a nested mapping.
    Structured {
        /// Name of the record type.
        type_name: String,
    },
}

impl ParamKind {
    /// The declared type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Primitive { type_name }
            | Self::Enumeration { type_name, .. }
            | Self::Structured { type_name } => type_name,
        }
    }

    /// The legal labels, present only for enumerations.
    #[must_use]
    pub fn choices(&self) -> Option<&[String]> {
        match self {
            Self::Enumeration { choices, .. } => Some(choices),
            _ => None,
        }
    }

    /// Whether raw values for this parameter must be built into a record type.
    #[must_use]
    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured { .. })
    }
}

/// Metadata for one declared parameter of a job (the session excluded).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamMetadata {
    /// Parameter name.
    pub name: String,
    /// Declared type.
    pub kind: ParamKind,
    /// Default value, if the parameter is optional.
    pub default: Option<Value>,
    /// Human-readable description.
    pub description: Option<String>,
    /// Whether callers must supply a value.
    pub required: bool,
}

impl ParamMetadata {
    /// The declared type name.
    #[must_use]
    pub fn declared_type(&self) -> &str {
        self.kind.type_name()
    }

    /// The legal labels, present only for enumerations.
    #[must_use]
    pub fn choices(&self) -> Option<&[String]> {
        self.kind.choices()
    }
}

/// Everything derived from a job by inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    /// The job's name.
    pub name: String,
    /// Documentation string.
    pub doc: Option<String>,
    /// Parameters in declaration order.
    pub params: Vec<ParamMetadata>,
}

impl JobMetadata {
    /// Look up a parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamMetadata> {
        self.params.iter().find(|p| p.name == name)
    }
}

/// One entry of a rule: a job name plus its raw arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobInvocation {
    /// Registered job name.
    pub name: String,
    /// Raw argument values keyed by parameter name.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub args: Map<String, Value>,
}

impl JobInvocation {
    /// An invocation with no arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
        }
    }

    /// Add an argument.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }
}

/// A declarative rule: conditions followed by actions.
///
/// # Example
///
/// ```
/// use sauron_types::{JobInvocation, Rule};
///
/// let rule = Rule::new()
///     .condition(JobInvocation::new("first_condition").with_arg("lower_number", 3))
///     .action(JobInvocation::new("print_the_equation"));
///
/// let names: Vec<_> = rule.into_jobs().into_iter().map(|j| j.name).collect();
/// assert_eq!(names, ["first_condition", "print_the_equation"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    /// Condition calls, in order.
    #[serde(default)]
    pub conditions: Vec<JobInvocation>,
    /// Action calls, in order.
    #[serde(default)]
    pub actions: Vec<JobInvocation>,
}

impl Rule {
    /// An empty rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a condition call.
    #[must_use]
    pub fn condition(mut self, invocation: JobInvocation) -> Self {
        self.conditions.push(invocation);
        self
    }

    /// Append an action call.
    #[must_use]
    pub fn action(mut self, invocation: JobInvocation) -> Self {
        self.actions.push(invocation);
        self
    }

    /// Flatten into execution order: conditions, then actions.
    #[must_use]
    pub fn into_jobs(self) -> Vec<JobInvocation> {
        let mut jobs = self.conditions;
        jobs.extend(self.actions);
        jobs
    }
}

/// A rule as submitted by a caller, before parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRule {
    /// An already-typed rule.
    Rule(Rule),
    /// A structured mapping with `conditions` / `actions` lists.
    Structured(Value),
    /// Text for the parser's front-end (JSON or YAML with the default parser).
    Text(String),
}

impl From<Rule> for RawRule {
    fn from(rule: Rule) -> Self {
        Self::Rule(rule)
    }
}

impl From<Value> for RawRule {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<String> for RawRule {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawRule {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}
