use researcher_core::schema::{FieldDefault, FieldDefinition, FieldType, RecordDefinition};
use researcher_core::tooling::BoundTool;
use std::fmt::Write;

/// Multi-line summary of a tool and its argument record.
pub fn describe_tool(tool: &BoundTool) -> String {
    let mut out = format!("{} - {}\n", tool.name(), tool.description());
    describe_record(tool.argument_type(), 1, &mut out);
    out
}

fn describe_record(record: &RecordDefinition, depth: usize, out: &mut String) {
    if record.is_empty() && depth == 1 {
        let _ = writeln!(out, "    (no arguments)");
    }
    for field in record.fields() {
        describe_field(field, depth, out);
    }
}

fn describe_field(field: &FieldDefinition, depth: usize, out: &mut String) {
    let indent = "    ".repeat(depth);
    let presence = match field.default() {
        FieldDefault::Required => "required".to_string(),
        FieldDefault::Absent => "optional".to_string(),
        FieldDefault::Value(value) => format!("default {value}"),
    };
    let _ = write!(
        out,
        "{indent}{}: {} ({presence})",
        field.name(),
        field.field_type().type_name()
    );
    if !field.description().is_empty() {
        let _ = write!(out, " - {}", field.description());
    }
    out.push('\n');

    let nested = match field.field_type() {
        FieldType::Record(record) | FieldType::Map(record) => Some(record),
        FieldType::Array(item) => match item.as_ref() {
            FieldType::Record(record) => Some(record),
            _ => None,
        },
        _ => None,
    };
    if let Some(record) = nested {
        describe_record(record, depth + 1, out);
    }
}
