use serde_json::{Map as JsonMap, Value, json};

/// Shape of one field in a [`RecordDefinition`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    Array(Box<FieldType>),
    Record(RecordDefinition),
    /// Dictionary from string keys to the record.
    Map(RecordDefinition),
}

impl FieldType {
    pub(crate) fn primitive(kind: &str) -> Option<Self> {
        match kind {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "integer" => Some(Self::Integer),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Short human-readable rendering, e.g. `array<integer>` or `map<string, search_filters>`.
    pub fn type_name(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Number => "number".to_string(),
            FieldType::Integer => "integer".to_string(),
            FieldType::Boolean => "boolean".to_string(),
            FieldType::Array(item) => format!("array<{}>", item.type_name()),
            FieldType::Record(record) => record.name().to_string(),
            FieldType::Map(record) => format!("map<string, {}>", record.name()),
        }
    }

    pub(crate) fn json_schema(&self) -> Value {
        match self {
            FieldType::String => json!({ "type": "string" }),
            FieldType::Number => json!({ "type": "number" }),
            FieldType::Integer => json!({ "type": "integer" }),
            FieldType::Boolean => json!({ "type": "boolean" }),
            FieldType::Array(item) => json!({ "type": "array", "items": item.json_schema() }),
            FieldType::Record(record) => record.to_json_schema(),
            FieldType::Map(record) => json!({
                "type": "object",
                "additionalProperties": record.to_json_schema(),
            }),
        }
    }
}

/// What happens when a caller omits a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    /// The field must be supplied.
    Required,
    /// The field may be omitted and is then left out of the instance.
    Absent,
    /// The field may be omitted and is then filled with this value.
    Value(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDefinition {
    name: String,
    ty: FieldType,
    default: FieldDefault,
    description: String,
}

impl FieldDefinition {
    pub(crate) fn new(
        name: impl Into<String>,
        ty: FieldType,
        default: FieldDefault,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ty,
            default,
            description: description.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> &FieldType {
        &self.ty
    }

    pub fn default(&self) -> &FieldDefault {
        &self.default
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_required(&self) -> bool {
        matches!(self.default, FieldDefault::Required)
    }

    fn json_schema(&self) -> Value {
        let mut schema = self.ty.json_schema();
        if let Value::Object(ref mut map) = schema {
            if !self.description.is_empty() {
                map.insert(
                    "description".to_string(),
                    Value::String(self.description.clone()),
                );
            }
            if let FieldDefault::Value(value) = &self.default {
                map.insert("default".to_string(), value.clone());
            }
        }
        schema
    }
}

/// Typed description of a tool's keyword arguments.
///
/// Built once by [`translate`](super::translate) and never mutated afterwards.
/// Field names are unique and keep the order the schema declared them in.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDefinition {
    name: String,
    fields: Vec<FieldDefinition>,
}

impl RecordDefinition {
    pub(crate) fn new(name: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|field| field.is_required())
    }

    /// Self-contained JSON Schema for this record, nested records inlined.
    pub fn to_json_schema(&self) -> Value {
        let properties: JsonMap<String, Value> = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.json_schema()))
            .collect();
        let required: Vec<Value> = self
            .required_fields()
            .map(|field| Value::String(field.name.clone()))
            .collect();

        json!({
            "title": self.name,
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}
