use super::error::ValidationError;
use super::record::{FieldDefault, FieldType, RecordDefinition};
use serde_json::{Map as JsonMap, Value};

impl RecordDefinition {
    /// Builds an instance of this record from keyword arguments.
    ///
    /// Required fields must be present, declared defaults are filled in and
    /// optional fields without a default are left out. A `null` for an
    /// optional field counts as omitted. Keys that name no field are dropped.
    pub fn instantiate(&self, args: &Value) -> Result<JsonMap<String, Value>, ValidationError> {
        let object = args.as_object().ok_or_else(|| ValidationError::NotAnObject {
            record: self.name().to_string(),
            found: kind_of(args),
        })?;
        self.instantiate_at(object, "")
    }

    fn instantiate_at(
        &self,
        object: &JsonMap<String, Value>,
        prefix: &str,
    ) -> Result<JsonMap<String, Value>, ValidationError> {
        let mut instance = JsonMap::new();
        for field in self.fields() {
            let path = join_path(prefix, field.name());
            let supplied = object
                .get(field.name())
                .filter(|value| field.is_required() || !value.is_null());
            match (supplied, field.default()) {
                (Some(value), _) => {
                    let checked = field.field_type().check(value, &path)?;
                    instance.insert(field.name().to_string(), checked);
                }
                (None, FieldDefault::Required) => {
                    return Err(ValidationError::MissingField { path });
                }
                (None, FieldDefault::Absent) => {}
                (None, FieldDefault::Value(default)) => {
                    instance.insert(field.name().to_string(), default.clone());
                }
            }
        }
        Ok(instance)
    }
}

impl FieldType {
    fn check(&self, value: &Value, path: &str) -> Result<Value, ValidationError> {
        let matches = match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array(item) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| self.mismatch(value, path))?;
                return items
                    .iter()
                    .enumerate()
                    .map(|(index, element)| item.check(element, &format!("{path}[{index}]")))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array);
            }
            FieldType::Record(record) => {
                let object = value
                    .as_object()
                    .ok_or_else(|| self.mismatch(value, path))?;
                return record.instantiate_at(object, path).map(Value::Object);
            }
            FieldType::Map(record) => {
                let object = value
                    .as_object()
                    .ok_or_else(|| self.mismatch(value, path))?;
                let mut entries = JsonMap::new();
                for (key, entry) in object {
                    let entry_path = join_path(path, key);
                    let entry_object = entry.as_object().ok_or_else(|| ValidationError::TypeMismatch {
                        path: entry_path.clone(),
                        expected: record.name().to_string(),
                        found: kind_of(entry),
                    })?;
                    entries.insert(
                        key.clone(),
                        Value::Object(record.instantiate_at(entry_object, &entry_path)?),
                    );
                }
                return Ok(Value::Object(entries));
            }
        };

        if matches {
            Ok(value.clone())
        } else {
            Err(self.mismatch(value, path))
        }
    }

    fn mismatch(&self, value: &Value, path: &str) -> ValidationError {
        ValidationError::TypeMismatch {
            path: path.to_string(),
            expected: self.type_name(),
            found: kind_of(value),
        }
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
