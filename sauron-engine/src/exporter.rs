//! Registry metadata export.

use std::fmt;
use std::str::FromStr;

use sauron_types::{EngineError, ParamMetadata};
use serde::Serialize;
use serde_json::Value;

use crate::registry::{JobRecord, Registry};

/// Output format for [`Exporter::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    /// In-memory structured value.
    #[default]
    Dict,
    /// Pretty-printed JSON text.
    Json,
    /// YAML text.
    Yaml,
}

impl ExportFormat {
    /// The lowercase format name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dict => "dict",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dict" => Ok(Self::Dict),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(EngineError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Exported metadata: a structured value or serialized text.
#[derive(Debug, Clone, PartialEq)]
pub enum Exported {
    /// Structured form (`dict`).
    Value(Value),
    /// Serialized form (`json`, `yaml`).
    Text(String),
}

impl Exported {
    /// The structured form, if this is one.
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    /// The text form, if this is one.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Value(_) => None,
        }
    }
}

/// Serializes registry metadata for external consumers (UIs, rule editors).
pub trait Exporter: Send + Sync {
    /// Export every registered job, in registration order.
    fn export(&self, registry: &Registry, format: ExportFormat) -> Result<Exported, EngineError>;
}

/// The built-in exporter.
///
/// Produces a list with one entry per job:
///
/// ```json
/// {
///   "name": "first_condition",
///   "label": "First Condition",
///   "category": "condition",
///   "params": [
///     {"name": "lower_number", "type": "integer", "choices": null,
///      "default": 10, "required": false, "description": null}
///   ],
///   "doc": "Checks if first number is lower than the second.",
///   "requires_session_keys": []
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultExporter;

impl Exporter for DefaultExporter {
    fn export(&self, registry: &Registry, format: ExportFormat) -> Result<Exported, EngineError> {
        let views: Vec<JobView<'_>> = registry.iter().map(JobView::from).collect();

        match format {
            ExportFormat::Dict => serde_json::to_value(&views)
                .map(Exported::Value)
                .map_err(|e| EngineError::Export(e.to_string())),
            ExportFormat::Json => serde_json::to_string_pretty(&views)
                .map(Exported::Text)
                .map_err(|e| EngineError::Export(e.to_string())),
            ExportFormat::Yaml => serde_yaml::to_string(&views)
                .map(Exported::Text)
                .map_err(|e| EngineError::Export(e.to_string())),
        }
    }
}

#[derive(Serialize)]
struct JobView<'a> {
    name: &'a str,
    label: &'a str,
    category: &'static str,
    params: Vec<ParamView<'a>>,
    doc: Option<&'a str>,
    requires_session_keys: &'a [String],
}

impl<'a> From<&'a JobRecord> for JobView<'a> {
    fn from(record: &'a JobRecord) -> Self {
        Self {
            name: record.name(),
            label: record.label(),
            category: record.category().as_str(),
            params: record.params().iter().map(ParamView::from).collect(),
            doc: record.metadata().doc.as_deref(),
            requires_session_keys: record.requires_session_keys(),
        }
    }
}

#[derive(Serialize)]
struct ParamView<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    type_name: &'a str,
    choices: Option<&'a [String]>,
    default: Option<&'a Value>,
    required: bool,
    description: Option<&'a str>,
}

impl<'a> From<&'a ParamMetadata> for ParamView<'a> {
    fn from(param: &'a ParamMetadata) -> Self {
        Self {
            name: &param.name,
            type_name: param.declared_type(),
            choices: param.choices(),
            default: param.default.as_ref(),
            required: param.required,
            description: param.description.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registration;
    use sauron_types::{FnJob, Session};
    use serde_json::json;
    use std::convert::Infallible;

    fn default_level() -> Level {
        Level::Low
    }

    #[derive(Debug, serde::Serialize, serde::Deserialize, schemars::JsonSchema)]
    enum Level {
        Low,
        High,
    }

    #[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
    struct AlertArgs {
        /// Severity of the alert.
        #[serde(default = "default_level")]
        level: Level,
        message: String,
    }

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register(
            FnJob::new("alert", |_: &mut Session, _: AlertArgs| Ok::<_, Infallible>(true))
                .with_doc("Raise an alert."),
            Registration::action()
                .with_label("Alert")
                .requiring(["user"]),
        );
        registry.register(
            FnJob::new("always", |_: &mut Session, _: sauron_types::NoArgs| {
                Ok::<_, Infallible>(true)
            }),
            Registration::condition(),
        );
        registry
    }

    #[test]
    fn format_names() {
        assert_eq!("dict".parse::<ExportFormat>().unwrap(), ExportFormat::Dict);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("yml".parse::<ExportFormat>().unwrap(), ExportFormat::Yaml);
        assert_eq!(ExportFormat::default(), ExportFormat::Dict);
        let err = "xml".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, EngineError::UnsupportedFormat(f) if f == "xml"));
    }

    #[test]
    fn dict_export_shape() {
        let exported = DefaultExporter
            .export(&registry(), ExportFormat::Dict)
            .unwrap();
        let value = exported.as_value().unwrap();

        assert_eq!(
            value[0],
            json!({
                "name": "alert",
                "label": "Alert",
                "category": "action",
                "params": [
                    {
                        "name": "level",
                        "type": "Level",
                        "choices": ["Low", "High"],
                        "default": "Low",
                        "required": false,
                        "description": "Severity of the alert."
                    },
                    {
                        "name": "message",
                        "type": "string",
                        "choices": null,
                        "default": null,
                        "required": true,
                        "description": null
                    }
                ],
                "doc": "Raise an alert.",
                "requires_session_keys": ["user"]
            })
        );
        assert_eq!(value[1]["name"], "always");
        assert_eq!(value[1]["label"], "always");
        assert_eq!(value[1]["params"], json!([]));
    }

    #[test]
    fn text_exports_round_trip_to_the_dict_form() {
        let registry = registry();
        let dict = DefaultExporter.export(&registry, ExportFormat::Dict).unwrap();
        let dict = dict.as_value().unwrap();

        let json_text = DefaultExporter.export(&registry, ExportFormat::Json).unwrap();
        let from_json: Value = serde_json::from_str(json_text.as_text().unwrap()).unwrap();
        assert_eq!(&from_json, dict);

        let yaml_text = DefaultExporter.export(&registry, ExportFormat::Yaml).unwrap();
        let from_yaml: Value = serde_yaml::from_str(yaml_text.as_text().unwrap()).unwrap();
        assert_eq!(&from_yaml, dict);
    }

    #[test]
    fn empty_registry_exports_empty_list() {
        let exported = DefaultExporter
            .export(&Registry::new(), ExportFormat::Dict)
            .unwrap();
        assert_eq!(exported, Exported::Value(json!([])));
    }
}
