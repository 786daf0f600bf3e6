//! Rule parsing: raw rule in, ordered job invocations out.

use sauron_types::{EngineError, JobInvocation, RawRule, Rule};
use serde_json::Value;

/// Converts a raw rule into the ordered sequence of job invocations to run.
///
/// Implementations must preserve declaration order (conditions, then
/// actions) and fail with [`EngineError::Parse`] when the input cannot be
/// resolved into that shape.
pub trait RuleParser: Send + Sync {
    /// Parse a raw rule.
    fn parse(&self, raw: &RawRule) -> Result<Vec<JobInvocation>, EngineError>;
}

/// Closures are parsers too.
impl<F> RuleParser for F
where
    F: Fn(&RawRule) -> Result<Vec<JobInvocation>, EngineError> + Send + Sync,
{
    fn parse(&self, raw: &RawRule) -> Result<Vec<JobInvocation>, EngineError> {
        self(raw)
    }
}

/// The built-in parser.
///
/// Accepts a typed [`Rule`], a mapping with `conditions` / `actions` lists
/// (either may be omitted), or text holding the same shape as JSON or YAML
/// (block or flow style).
/// Unknown keys are rejected at both the rule and the entry level.
///
/// # Example
///
/// ```
/// use sauron_engine::{DefaultParser, RuleParser};
/// use sauron_types::RawRule;
///
/// let text = r#"
/// conditions:
///   - name: first_condition
///     args: {lower_number: 3, greater_number: 10}
/// actions:
///   - name: print_the_equation
/// "#;
/// let jobs = DefaultParser.parse(&RawRule::from(text)).unwrap();
/// assert_eq!(jobs[0].name, "first_condition");
/// assert_eq!(jobs[1].name, "print_the_equation");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;

impl RuleParser for DefaultParser {
    fn parse(&self, raw: &RawRule) -> Result<Vec<JobInvocation>, EngineError> {
        let rule = match raw {
            RawRule::Rule(rule) => rule.clone(),
            RawRule::Structured(Value::String(text)) => parse_text(text)?,
            RawRule::Structured(value) => serde_json::from_value(value.clone())
                .map_err(|e| EngineError::Parse(e.to_string()))?,
            RawRule::Text(text) => parse_text(text)?,
        };

        let jobs = rule.into_jobs();
        tracing::debug!(jobs = jobs.len(), "sauron.rule.parsed");
        Ok(jobs)
    }
}

fn parse_text(text: &str) -> Result<Rule, EngineError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Parse("empty rule".into()));
    }

    if !trimmed.starts_with('{') {
        return serde_yaml::from_str(trimmed)
            .map_err(|e| EngineError::Parse(format!("yaml: {e}")));
    }

    // A leading brace is JSON or a YAML flow mapping; the JSON error is the
    // one reported when neither parses
    serde_json::from_str(trimmed).or_else(|json_err| {
        serde_yaml::from_str(trimmed)
            .map_err(|_| EngineError::Parse(format!("json: {json_err}")))
    })
}
