//! The engine facade: registration, rule runs, and metadata export.

use sauron_types::{EngineError, JobDyn, JobInvocation, RawRule, Session};

use crate::config::EngineConfig;
use crate::executor;
use crate::exporter::{DefaultExporter, ExportFormat, Exported, Exporter};
use crate::parser::{DefaultParser, RuleParser};
use crate::registry::{JobHandle, Registration, Registry};

/// Registers jobs and runs rules against a session.
///
/// [`Engine::run`] uses the session the engine carries, so results accumulate
/// across runs. [`Engine::run_with`] takes a caller-owned session and only
/// needs `&self`, which lets one engine serve many threads.
///
/// # Example
///
/// ```
/// use sauron_engine::Engine;
/// use sauron_types::{FnJob, NoArgs, Session};
/// use serde_json::json;
///
/// let mut engine = Engine::new();
/// engine.register_condition(
///     FnJob::new("always", |_: &mut Session, _: NoArgs| Ok::<_, std::convert::Infallible>(true)),
///     None,
/// );
/// engine.run(json!({"conditions": [{"name": "always"}]})).unwrap();
/// assert_eq!(engine.session().results()[0].output, json!(true));
/// ```
pub struct Engine {
    registry: Registry,
    parser: Box<dyn RuleParser>,
    exporter: Box<dyn Exporter>,
    config: EngineConfig,
    session: Session,
}

impl Engine {
    /// Create an engine with the default parser, exporter, and config.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start building an engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Register a condition. The label defaults to the job name.
    pub fn register_condition<J: JobDyn + 'static>(
        &mut self,
        job: J,
        label: Option<&str>,
    ) -> JobHandle {
        self.register(job, labelled(Registration::condition(), label))
    }

    /// Register an action that expects `requires_session_keys` to be set by
    /// earlier jobs.
    pub fn register_action<J: JobDyn + 'static>(
        &mut self,
        job: J,
        label: Option<&str>,
        requires_session_keys: &[&str],
    ) -> JobHandle {
        let registration =
            labelled(Registration::action(), label).requiring(requires_session_keys.iter().copied());
        self.register(job, registration)
    }

    /// Register a generic job.
    pub fn register_job<J: JobDyn + 'static>(&mut self, job: J, label: Option<&str>) -> JobHandle {
        self.register(job, labelled(Registration::job(), label))
    }

    /// Register a job with an explicit [`Registration`].
    pub fn register<J: JobDyn + 'static>(&mut self, job: J, registration: Registration) -> JobHandle {
        self.registry.register(job, registration)
    }

    /// Parse a raw rule into its ordered job invocations without running it.
    pub fn parse(&self, rule: impl Into<RawRule>) -> Result<Vec<JobInvocation>, EngineError> {
        self.parser.parse(&rule.into())
    }

    /// Run a rule against the engine's own session.
    ///
    /// Jobs run in order until one returns a falsy value. Results are
    /// appended to [`Engine::session`]; entries from earlier runs are kept.
    pub fn run(&mut self, rule: impl Into<RawRule>) -> Result<(), EngineError> {
        let jobs = self.parser.parse(&rule.into())?;
        executor::execute(&self.registry, jobs, &mut self.session, &self.config)
    }

    /// Run a rule against a caller-owned session.
    pub fn run_with(
        &self,
        rule: impl Into<RawRule>,
        session: &mut Session,
    ) -> Result<(), EngineError> {
        let jobs = self.parser.parse(&rule.into())?;
        executor::execute(&self.registry, jobs, session, &self.config)
    }

    /// Export registry metadata. `format` is `"dict"`, `"json"`, or `"yaml"`.
    pub fn export_metadata(&self, format: &str) -> Result<Exported, EngineError> {
        let format: ExportFormat = format.parse()?;
        self.exporter.export(&self.registry, format)
    }

    /// The carried session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the carried session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Take the carried session, leaving an empty one in its place.
    pub fn take_session(&mut self) -> Session {
        std::mem::take(&mut self.session)
    }

    /// The job registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

fn labelled(registration: Registration, label: Option<&str>) -> Registration {
    match label {
        Some(label) => registration.with_label(label),
        None => registration,
    }
}

/// Builder for an [`Engine`].
///
/// Everything is optional: the default parser reads JSON/YAML rules, the
/// default exporter writes `dict`/`json`/`yaml`, and the session starts empty.
///
/// ```
/// use sauron_engine::{Engine, EngineConfig};
/// use sauron_types::Session;
///
/// let mut context = serde_json::Map::new();
/// context.insert("user".into(), "ada".into());
///
/// let engine = Engine::builder()
///     .config(EngineConfig { enforce_required_session_keys: false })
///     .session(Session::from_context(context))
///     .build();
/// assert!(engine.session().contains_key("user"));
/// ```
#[derive(Default)]
pub struct EngineBuilder {
    parser: Option<Box<dyn RuleParser>>,
    exporter: Option<Box<dyn Exporter>>,
    config: EngineConfig,
    session: Session,
}

impl EngineBuilder {
    /// Use a custom rule parser.
    #[must_use]
    pub fn parser<P: RuleParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Use a custom metadata exporter.
    #[must_use]
    pub fn exporter<E: Exporter + 'static>(mut self, exporter: E) -> Self {
        self.exporter = Some(Box::new(exporter));
        self
    }

    /// Set the engine configuration.
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Seed the carried session.
    #[must_use]
    pub fn session(mut self, session: Session) -> Self {
        self.session = session;
        self
    }

    /// Build the [`Engine`].
    #[must_use]
    pub fn build(self) -> Engine {
        Engine {
            registry: Registry::new(),
            parser: self.parser.unwrap_or_else(|| Box::new(DefaultParser)),
            exporter: self.exporter.unwrap_or_else(|| Box::new(DefaultExporter)),
            config: self.config,
            session: self.session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sauron_types::{FnJob, JobCategory, NoArgs};
    use serde_json::{Value, json};
    use std::convert::Infallible;

    #[derive(serde::Deserialize, schemars::JsonSchema)]
    struct FlagArgs {
        value: bool,
    }

    fn engine() -> Engine {
        let mut engine = Engine::new();
        engine.register_condition(
            FnJob::new("flag", |session: &mut Session, args: FlagArgs| {
                session.insert("flag", args.value);
                Ok::<_, Infallible>(args.value)
            }),
            Some("Flag"),
        );
        engine.register_action(
            FnJob::new("shout", |session: &mut Session, _: NoArgs| {
                Ok::<_, Infallible>(session.get("flag").cloned().unwrap_or(Value::Null))
            }),
            None,
            &["flag"],
        );
        engine
    }

    fn rule(value: bool) -> Value {
        json!({
            "conditions": [{"name": "flag", "args": {"value": value}}],
            "actions": [{"name": "shout"}]
        })
    }

    #[test]
    fn registration_helpers_set_category_and_label() {
        let mut engine = engine();
        engine.register_job(
            FnJob::new("plain", |_: &mut Session, _: NoArgs| Ok::<_, Infallible>(1)),
            None,
        );
        let registry = engine.registry();
        assert_eq!(registry.lookup("flag").unwrap().category(), JobCategory::Condition);
        assert_eq!(registry.lookup("flag").unwrap().label(), "Flag");
        assert_eq!(registry.lookup("shout").unwrap().requires_session_keys(), ["flag"]);
        assert_eq!(registry.lookup("plain").unwrap().category(), JobCategory::Job);
    }

    #[test]
    fn run_accumulates_in_carried_session() {
        let mut engine = engine();
        engine.run(rule(true)).unwrap();
        engine.run(rule(false)).unwrap();

        let ran: Vec<_> = engine
            .session()
            .results()
            .iter()
            .map(|r| (r.job.as_str(), r.output.clone()))
            .collect();
        assert_eq!(
            ran,
            [("flag", json!(true)), ("shout", json!(true)), ("flag", json!(false))]
        );

        let taken = engine.take_session();
        assert_eq!(taken.results().len(), 3);
        assert!(engine.session().results().is_empty());
    }

    #[test]
    fn run_with_leaves_carried_session_alone() {
        let engine = engine();
        let mut session = Session::new();
        engine.run_with(rule(true), &mut session).unwrap();
        assert_eq!(session.results().len(), 2);
        assert!(engine.session().results().is_empty());
    }

    #[test]
    fn parse_error_runs_nothing() {
        let mut engine = engine();
        let err = engine.run("conditions: {oops").unwrap_err();
        assert!(matches!(err, EngineError::Parse(_)));
        assert!(engine.session().results().is_empty());
    }

    #[test]
    fn custom_parser_is_used() {
        let mut engine = Engine::builder()
            .parser(|raw: &RawRule| match raw {
                RawRule::Text(name) => Ok(vec![JobInvocation::new(name.clone())]),
                _ => Err(EngineError::Parse("names only".into())),
            })
            .build();
        engine.register_job(
            FnJob::new("ping", |_: &mut Session, _: NoArgs| Ok::<_, Infallible>("pong")),
            None,
        );
        engine.run("ping").unwrap();
        assert_eq!(engine.session().results()[0].output, json!("pong"));
        assert_eq!(engine.parse("ping").unwrap()[0].name, "ping");
    }

    #[test]
    fn export_metadata_by_name() {
        let engine = engine();
        let dict = engine.export_metadata("dict").unwrap();
        assert_eq!(dict.as_value().unwrap()[0]["label"], "Flag");
        assert!(engine.export_metadata("yaml").unwrap().as_text().is_some());
        assert!(matches!(
            engine.export_metadata("toml"),
            Err(EngineError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }
}
