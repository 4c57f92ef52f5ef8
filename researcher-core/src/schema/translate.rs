use super::error::SchemaError;
use super::record::{FieldDefault, FieldDefinition, FieldType, RecordDefinition};
use super::validate::kind_of;
use serde_json::{Map as JsonMap, Value};
use tracing::debug;

/// Property names that describe the schema itself rather than a field.
const RESERVED_NAMES: [&str; 4] = ["properties", "required", "default", "additionalProperties"];

/// `type` value treated the same as a missing `type`.
const UNTYPED: &str = "default";

/// Translates a JSON-Schema-like object into a [`RecordDefinition`] named `name`.
///
/// Coverage is deliberately narrow: primitives, arrays of primitives or
/// objects, nested objects, and `$ref` / `additionalProperties.$ref` resolved
/// against a sibling property of the same schema by the reference's last
/// path segment. Anything else is a [`SchemaError`]. Nested records are
/// named `{name}_{field}`.
pub fn translate(name: &str, schema: &Value) -> Result<RecordDefinition, SchemaError> {
    let schema = schema
        .as_object()
        .ok_or_else(|| SchemaError::InvalidSchema {
            record: name.to_string(),
            reason: format!("expected an object, found {}", kind_of(schema)),
        })?;

    let properties = match schema.get("properties") {
        None => return Ok(RecordDefinition::new(name, Vec::new())),
        Some(Value::Object(properties)) => properties,
        Some(other) => {
            return Err(SchemaError::InvalidSchema {
                record: name.to_string(),
                reason: format!("'properties' must be an object, found {}", kind_of(other)),
            });
        }
    };

    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut fields = Vec::with_capacity(properties.len());
    for (field, info) in properties {
        if RESERVED_NAMES.contains(&field.as_str()) {
            debug!(
                record = name,
                field = field.as_str(),
                "skipping reserved property name"
            );
            continue;
        }
        let kind = match info.get("type") {
            None => {
                debug!(
                    record = name,
                    field = field.as_str(),
                    "skipping property without a declared type"
                );
                continue;
            }
            Some(Value::String(kind)) if kind == UNTYPED => {
                debug!(
                    record = name,
                    field = field.as_str(),
                    "skipping property without a declared type"
                );
                continue;
            }
            Some(Value::String(kind)) => kind.as_str(),
            Some(other) => {
                return Err(SchemaError::UnsupportedKind {
                    field: field.clone(),
                    kind: other.to_string(),
                });
            }
        };

        let ty = field_type(name, field, kind, info, properties)?;
        let default = if required.contains(&field.as_str()) {
            FieldDefault::Required
        } else {
            info.get("default")
                .cloned()
                .map_or(FieldDefault::Absent, FieldDefault::Value)
        };
        let description = info
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default();

        fields.push(FieldDefinition::new(field, ty, default, description));
    }

    Ok(RecordDefinition::new(name, fields))
}

fn field_type(
    record: &str,
    field: &str,
    kind: &str,
    info: &Value,
    siblings: &JsonMap<String, Value>,
) -> Result<FieldType, SchemaError> {
    match kind {
        "array" => array_type(record, field, info),
        "object" => object_type(record, field, kind, info, siblings),
        other => FieldType::primitive(other).ok_or_else(|| SchemaError::UnsupportedKind {
            field: field.to_string(),
            kind: other.to_string(),
        }),
    }
}

fn array_type(record: &str, field: &str, info: &Value) -> Result<FieldType, SchemaError> {
    let (items, item_kind) = info
        .get("items")
        .and_then(|items| Some((items, items.get("type")?.as_str()?)))
        .ok_or_else(|| SchemaError::MissingItemsType {
            field: field.to_string(),
        })?;

    let item = if item_kind == "object" {
        FieldType::Record(translate(&nested_name(record, field), items)?)
    } else {
        FieldType::primitive(item_kind).ok_or_else(|| SchemaError::UnsupportedKind {
            field: field.to_string(),
            kind: format!("array<{item_kind}>"),
        })?
    };
    Ok(FieldType::Array(Box::new(item)))
}

fn object_type(
    record: &str,
    field: &str,
    kind: &str,
    info: &Value,
    siblings: &JsonMap<String, Value>,
) -> Result<FieldType, SchemaError> {
    let nested = nested_name(record, field);

    let has_properties = info
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|properties| !properties.is_empty());
    if has_properties {
        return Ok(FieldType::Record(translate(&nested, info)?));
    }

    if let Some(reference) = non_empty_str(info.get("$ref")) {
        let target = resolve_sibling(field, reference, siblings)?;
        return Ok(FieldType::Record(translate(&nested, target)?));
    }

    let additional = info.get("additionalProperties").and_then(|extra| extra.get("$ref"));
    if let Some(reference) = non_empty_str(additional) {
        let target = resolve_sibling(field, reference, siblings)?;
        return Ok(FieldType::Map(translate(&nested, target)?));
    }

    Err(SchemaError::UnsupportedObject {
        field: field.to_string(),
        kind: kind.to_string(),
    })
}

/// Single-level lookup: `#/$defs/Filters` resolves to the sibling property `Filters`.
fn resolve_sibling<'a>(
    field: &str,
    reference: &str,
    siblings: &'a JsonMap<String, Value>,
) -> Result<&'a Value, SchemaError> {
    let target = reference.rsplit('/').next().unwrap_or(reference);
    siblings
        .get(target)
        .ok_or_else(|| SchemaError::UnresolvedReference {
            field: field.to_string(),
            reference: reference.to_string(),
        })
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

fn nested_name(record: &str, field: &str) -> String {
    format!("{record}_{field}")
}
