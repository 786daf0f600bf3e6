//! Job execution: argument binding, invocation, result recording, and the
//! short-circuit gate.

use sauron_types::{EngineError, JobError, JobInvocation, ParamKind, Session};
use serde_json::{Map, Value};

use crate::config::EngineConfig;
use crate::registry::{JobRecord, Registry};

/// The one control-flow gate: whether a job's result lets the rule continue.
///
/// `null`, `false`, numeric zero, `""`, `[]` and `{}` are falsy. Everything
/// else is truthy.
///
/// ```
/// use sauron_engine::is_successful;
/// use serde_json::json;
///
/// assert!(is_successful(&json!(true)));
/// assert!(is_successful(&json!("ok")));
/// assert!(!is_successful(&json!(null)));
/// assert!(!is_successful(&json!(0)));
/// ```
#[must_use]
pub fn is_successful(result: &Value) -> bool {
    match result {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Call one job against the session and record its result.
///
/// Checks the job's required session keys (when enabled), binds the raw
/// arguments against its parameter metadata, invokes it, and appends
/// `{job, return}` to the session's results log. The session is mutated in
/// place; the raw result is returned.
pub fn bind_and_call(
    record: &JobRecord,
    args: Map<String, Value>,
    session: &mut Session,
    config: &EngineConfig,
) -> Result<Value, EngineError> {
    if config.enforce_required_session_keys {
        check_required_keys(record, session)?;
    }
    bind_arguments(record, &args)?;

    tracing::debug!(job = %record.name(), args = args.len(), "sauron.job.call");

    let result = record
        .job()
        .call_dyn(session, args)
        .map_err(|source| match source {
            JobError::InvalidArguments(reason) => EngineError::ArgumentBinding {
                job: record.name().to_string(),
                reason,
            },
            other => EngineError::JobFailed {
                job: record.name().to_string(),
                source: other,
            },
        })?;

    session.record_result(record.name(), result.clone());
    tracing::debug!(
        job = %record.name(),
        success = is_successful(&result),
        "sauron.job.result"
    );

    Ok(result)
}

/// Run an ordered job sequence, stopping at the first falsy result.
///
/// Unknown names abort with [`EngineError::UnknownJob`] before anything is
/// recorded for that entry.
pub fn execute(
    registry: &Registry,
    jobs: Vec<JobInvocation>,
    session: &mut Session,
    config: &EngineConfig,
) -> Result<(), EngineError> {
    for invocation in jobs {
        let record = registry.lookup(&invocation.name)?;
        let result = bind_and_call(record, invocation.args, session, config)?;
        if !is_successful(&result) {
            tracing::info!(job = %record.name(), "sauron.rule.short_circuit");
            break;
        }
    }
    Ok(())
}

fn check_required_keys(record: &JobRecord, session: &Session) -> Result<(), EngineError> {
    let missing: Vec<String> = record
        .requires_session_keys()
        .iter()
        .filter(|key| !session.contains_key(key))
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::MissingSessionKeys {
            job: record.name().to_string(),
            missing,
        })
    }
}

/// Check every provided argument against its declared parameter.
///
/// Structured parameters need a mapping to build their record type from,
/// enumerations need one of their labels, primitives pass through. The
/// typed conversion itself happens when the job deserializes its arguments.
fn bind_arguments(record: &JobRecord, args: &Map<String, Value>) -> Result<(), EngineError> {
    let fail = |reason: String| EngineError::ArgumentBinding {
        job: record.name().to_string(),
        reason,
    };

    for (key, value) in args {
        let param = record
            .param(key)
            .ok_or_else(|| fail(format!("unknown parameter '{key}'")))?;

        if value.is_null() && !param.required {
            continue;
        }

        match &param.kind {
            ParamKind::Structured { type_name } => {
                if !value.is_object() {
                    return Err(fail(format!(
                        "parameter '{key}' expects a mapping to build {type_name}, got {}",
                        json_type_name(value)
                    )));
                }
            }
            ParamKind::Enumeration { type_name, choices } => {
                let valid = value
                    .as_str()
                    .is_some_and(|label| choices.iter().any(|c| c == label));
                if !valid {
                    return Err(fail(format!(
                        "parameter '{key}' must be one of [{}] ({type_name}), got {value}",
                        choices.join(", ")
                    )));
                }
            }
            ParamKind::Primitive { .. } => {}
        }
    }

    Ok(())
}

/// Return the JSON type name for a value (for error messages).
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registration;
    use sauron_types::{FnJob, NoArgs};
    use serde_json::json;
    use std::convert::Infallible;

    #[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
    enum Color {
        Red,
        Green,
    }

    #[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
    struct PaintArgs {
        color: Color,
        at: Point,
        #[serde(default)]
        note: Option<String>,
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(
            FnJob::new("paint", |session: &mut Session, args: PaintArgs| {
                session.insert("painted", format!("{:?}@{},{}", args.color, args.at.x, args.at.y));
                Ok::<_, Infallible>(args.note)
            }),
            Registration::action(),
        );
        registry.register(
            FnJob::new("needs_user", |_: &mut Session, _: NoArgs| Ok::<_, Infallible>(true)),
            Registration::action().requiring(["user"]),
        );
        registry
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn falsy_table() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(!is_successful(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(-1), json!(0.5), json!("x"), json!([0]), json!({"a": null})] {
            assert!(is_successful(&truthy), "{truthy} should be truthy");
        }
    }

    #[test]
    fn structured_argument_is_built_from_mapping() {
        let registry = registry();
        let mut session = Session::new();
        let out = bind_and_call(
            registry.lookup("paint").unwrap(),
            args(json!({"color": "Green", "at": {"x": 1, "y": 2}, "note": "hi"})),
            &mut session,
            &EngineConfig::default(),
        )
        .unwrap();
        assert_eq!(out, json!("hi"));
        assert_eq!(session.get("painted"), Some(&json!("Green@1,2")));
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn structured_argument_rejects_scalar() {
        let registry = registry();
        let mut session = Session::new();
        let err = bind_and_call(
            registry.lookup("paint").unwrap(),
            args(json!({"color": "Red", "at": 5})),
            &mut session,
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ArgumentBinding { ref reason, .. } if reason.contains("Point")));
        assert!(session.results().is_empty());
    }

    #[test]
    fn structured_argument_with_missing_field_fails_binding() {
        let registry = registry();
        let mut session = Session::new();
        let err = bind_and_call(
            registry.lookup("paint").unwrap(),
            args(json!({"color": "Red", "at": {"x": 1}})),
            &mut session,
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::ArgumentBinding { .. }));
    }

    #[test]
    fn enumeration_rejects_unknown_label() {
        let registry = registry();
        let mut session = Session::new();
        let err = bind_and_call(
            registry.lookup("paint").unwrap(),
            args(json!({"color": "Purple", "at": {"x": 0, "y": 0}})),
            &mut session,
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Red, Green"));
    }

    #[test]
    fn unknown_parameter_is_rejected() {
        let registry = registry();
        let mut session = Session::new();
        let err = bind_and_call(
            registry.lookup("paint").unwrap(),
            args(json!({"colour": "Red"})),
            &mut session,
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("unknown parameter 'colour'"));
    }

    #[test]
    fn required_session_keys_are_enforced() {
        let registry = registry();
        let record = registry.lookup("needs_user").unwrap();
        let mut session = Session::new();

        let err = bind_and_call(record, Map::new(), &mut session, &EngineConfig::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingSessionKeys { ref missing, .. } if missing == &["user"]));

        session.insert("user", "ada");
        let out = bind_and_call(record, Map::new(), &mut session, &EngineConfig::default()).unwrap();
        assert_eq!(out, json!(true));
    }

    #[test]
    fn enforcement_can_be_disabled() {
        let registry = registry();
        let config = EngineConfig {
            enforce_required_session_keys: false,
        };
        let mut session = Session::new();
        let out = bind_and_call(
            registry.lookup("needs_user").unwrap(),
            Map::new(),
            &mut session,
            &config,
        )
        .unwrap();
        assert_eq!(out, json!(true));
    }

    #[test]
    fn execute_stops_at_first_falsy_result() {
        let registry = registry();
        let mut session = Session::new();
        session.insert("user", "ada");
        let jobs = vec![
            JobInvocation::new("needs_user"),
            JobInvocation::new("paint")
                .with_arg("color", "Red")
                .with_arg("at", json!({"x": 0, "y": 0})),
            JobInvocation::new("needs_user"),
        ];
        execute(&registry, jobs, &mut session, &EngineConfig::default()).unwrap();

        let ran: Vec<_> = session.results().iter().map(|r| r.job.as_str()).collect();
        assert_eq!(ran, ["needs_user", "paint"]);
        assert_eq!(session.results()[1].output, Value::Null);
    }

    #[test]
    fn execute_fails_on_unknown_job_without_recording() {
        let registry = registry();
        let mut session = Session::new();
        let err = execute(
            &registry,
            vec![JobInvocation::new("ghost")],
            &mut session,
            &EngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::UnknownJob(_)));
        assert!(session.results().is_empty());
    }
}
