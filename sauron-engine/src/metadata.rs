//! Parameter metadata derived from a job's argument JSON Schema.
//!
//! The argument type of every job implements `schemars::JsonSchema`, so its
//! schema is the reflection surface: each property becomes one
//! [`ParamMetadata`], classified once into a [`ParamKind`] that the binder in
//! [`crate::executor`] consumes.

use sauron_types::{JobDyn, JobMetadata, ParamKind, ParamMetadata};
use serde_json::{Map, Value};

/// Nesting limit when following `$ref` / `allOf` / `anyOf` wrappers.
const MAX_RESOLVE_DEPTH: usize = 8;

/// Derive name, documentation, and parameter metadata for a job.
#[must_use]
pub fn extract(job: &dyn JobDyn) -> JobMetadata {
    JobMetadata {
        name: job.name().to_string(),
        doc: job.doc().map(str::to_string),
        params: params_from_schema(&job.args_schema()),
    }
}

/// Build parameter metadata from an object schema, in property order.
///
/// Non-object schemas yield no parameters.
#[must_use]
pub fn params_from_schema(schema: &Value) -> Vec<ParamMetadata> {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Vec::new();
    };
    let definitions = schema
        .get("definitions")
        .or_else(|| schema.get("$defs"))
        .and_then(Value::as_object);
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    properties
        .iter()
        .map(|(name, prop)| ParamMetadata {
            name: name.clone(),
            kind: classify(prop, definitions),
            default: prop.get("default").cloned(),
            description: prop
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            required: required.contains(&name.as_str()),
        })
        .collect()
}

/// Classify one property schema into primitive, enumeration, or structured.
fn classify(prop: &Value, definitions: Option<&Map<String, Value>>) -> ParamKind {
    let (ref_name, target) = resolve(prop, definitions, 0);

    if let Some(choices) = enum_choices(target) {
        return ParamKind::Enumeration {
            type_name: ref_name.unwrap_or("string").to_string(),
            choices,
        };
    }

    let json_type = json_type(target);
    match ref_name {
        Some(name)
            if json_type == Some("object")
                || target.get("properties").is_some()
                || is_object_union(target) =>
        {
            ParamKind::Structured {
                type_name: name.to_string(),
            }
        }
        Some(name) if json_type.is_none() => ParamKind::Primitive {
            type_name: name.to_string(),
        },
        _ => ParamKind::Primitive {
            type_name: json_type.unwrap_or("any").to_string(),
        },
    }
}

/// Follow `$ref`, single-element `allOf`, and nullable `anyOf` wrappers.
///
/// Returns the referenced definition name (if any) and the resolved schema.
fn resolve<'a>(
    schema: &'a Value,
    definitions: Option<&'a Map<String, Value>>,
    depth: usize,
) -> (Option<&'a str>, &'a Value) {
    if depth >= MAX_RESOLVE_DEPTH {
        return (None, schema);
    }

    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        let name = reference
            .strip_prefix("#/definitions/")
            .or_else(|| reference.strip_prefix("#/$defs/"))
            .unwrap_or(reference);
        return match definitions.and_then(|defs| defs.get(name)) {
            Some(target) => {
                let (_, inner) = resolve(target, definitions, depth + 1);
                (Some(name), inner)
            }
            None => (Some(name), schema),
        };
    }

    if let Some([only]) = schema.get("allOf").and_then(Value::as_array).map(Vec::as_slice) {
        return resolve(only, definitions, depth + 1);
    }

    if let Some(branches) = schema.get("anyOf").and_then(Value::as_array) {
        let non_null: Vec<&Value> = branches
            .iter()
            .filter(|b| b.get("type").and_then(Value::as_str) != Some("null"))
            .collect();
        if let [only] = non_null.as_slice() {
            return resolve(only, definitions, depth + 1);
        }
    }

    (None, schema)
}

/// String labels of an enumeration schema, in declared order.
///
/// Handles both `{"enum": [...]}` and a `oneOf` of single-label enums (the
/// shape produced when variants carry doc comments).
fn enum_choices(schema: &Value) -> Option<Vec<String>> {
    if let Some(values) = schema.get("enum").and_then(Value::as_array) {
        return values
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect();
    }

    let branches = schema.get("oneOf").and_then(Value::as_array)?;
    let mut choices = Vec::with_capacity(branches.len());
    for branch in branches {
        let labels = branch.get("enum").and_then(Value::as_array)?;
        for label in labels {
            choices.push(label.as_str()?.to_string());
        }
    }
    if choices.is_empty() { None } else { Some(choices) }
}

/// A `oneOf` / `anyOf` whose every branch is a mapping, as data-carrying
/// enum variants render.
fn is_object_union(schema: &Value) -> bool {
    ["oneOf", "anyOf"]
        .iter()
        .filter_map(|key| schema.get(*key).and_then(Value::as_array))
        .any(|branches| {
            !branches.is_empty()
                && branches.iter().all(|b| {
                    json_type(b) == Some("object") || b.get("properties").is_some()
                })
        })
}

/// The JSON type name of a schema, skipping `null` in nullable unions.
fn json_type(schema: &Value) -> Option<&str> {
    match schema.get("type")? {
        Value::String(ty) => Some(ty),
        Value::Array(types) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|ty| *ty != "null"),
        _ => None,
    }
}
