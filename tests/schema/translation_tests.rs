// Schema translation tests - JSON Schema to RecordDefinition
//
// Exercises translate() through the public API only, the same way a tool
// binding consumes it, and checks the resulting records with instantiate().

use researcher_core::schema::{FieldDefault, FieldType, SchemaError, ValidationError, translate};
use serde_json::json;

#[test]
fn required_primitives_keep_declaration_order() {
    let record = translate(
        "primitives",
        &json!({
            "type": "object",
            "properties": {
                "name": {"type": "string"},
                "ratio": {"type": "number"},
                "count": {"type": "integer"},
                "enabled": {"type": "boolean"}
            },
            "required": ["name", "ratio", "count", "enabled"]
        }),
    )
    .expect("translates");

    let names: Vec<&str> = record.fields().iter().map(|field| field.name()).collect();
    assert_eq!(names, ["name", "ratio", "count", "enabled"]);
    assert!(record.fields().iter().all(|field| field.is_required()));
    assert_eq!(record.field("ratio").map(|f| f.field_type()), Some(&FieldType::Number));
    assert_eq!(record.field("count").map(|f| f.field_type()), Some(&FieldType::Integer));
}

#[test]
fn optional_fields_use_declared_default_or_stay_absent() {
    let record = translate(
        "search",
        &json!({
            "properties": {
                "q": {"type": "string"},
                "n": {"type": "integer", "default": 5},
                "site": {"type": "string"}
            },
            "required": ["q"]
        }),
    )
    .expect("translates");

    assert_eq!(record.field("q").map(|f| f.default()), Some(&FieldDefault::Required));
    assert_eq!(
        record.field("n").map(|f| f.default()),
        Some(&FieldDefault::Value(json!(5)))
    );
    assert_eq!(record.field("site").map(|f| f.default()), Some(&FieldDefault::Absent));

    let instance = record.instantiate(&json!({"q": "rust"})).expect("valid");
    assert_eq!(serde_json::Value::Object(instance), json!({"q": "rust", "n": 5}));

    let missing = record.instantiate(&json!({"n": 3})).unwrap_err();
    assert_eq!(
        missing,
        ValidationError::MissingField {
            path: "q".to_string()
        }
    );
}

#[test]
fn reserved_and_untyped_properties_are_skipped() {
    let record = translate(
        "odd",
        &json!({
            "properties": {
                "properties": {"type": "string"},
                "required": {"type": "string"},
                "default": {"type": "string"},
                "additionalProperties": {"type": "string"},
                "untyped": {"description": "no type here"},
                "placeholder": {"type": "default"},
                "kept": {"type": "string"}
            }
        }),
    )
    .expect("translates");

    assert_eq!(record.len(), 1);
    assert!(record.field("kept").is_some());
}

#[test]
fn schema_without_properties_is_an_empty_record() {
    let record = translate("ping", &json!({"type": "object"})).expect("translates");
    assert!(record.is_empty());
    assert_eq!(record.name(), "ping");
    assert!(record.instantiate(&json!({"ignored": true})).expect("valid").is_empty());
}

#[test]
fn nested_objects_round_trip_through_instantiate() {
    let record = translate(
        "website_firecrawl",
        &json!({
            "properties": {
                "query": {"type": "string"},
                "options": {
                    "type": "object",
                    "properties": {
                        "depth": {"type": "integer", "default": 1},
                        "formats": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["formats"]
                }
            },
            "required": ["query", "options"]
        }),
    )
    .expect("translates");

    let Some(FieldType::Record(options)) = record.field("options").map(|f| f.field_type()) else {
        panic!("options should be a nested record");
    };
    assert_eq!(options.name(), "website_firecrawl_options");

    let instance = record
        .instantiate(&json!({"query": "docs", "options": {"formats": ["markdown"]}}))
        .expect("valid");
    assert_eq!(
        serde_json::Value::Object(instance),
        json!({"query": "docs", "options": {"depth": 1, "formats": ["markdown"]}})
    );

    let bad = record
        .instantiate(&json!({"query": "docs", "options": {"formats": ["markdown", 7]}}))
        .unwrap_err();
    assert!(
        matches!(bad, ValidationError::TypeMismatch { ref path, .. } if path == "options.formats[1]")
    );
}

#[test]
fn arrays_of_objects_accept_empty_lists() {
    let record = translate(
        "batch",
        &json!({
            "properties": {
                "pages": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {"url": {"type": "string"}},
                        "required": ["url"]
                    }
                }
            },
            "required": ["pages"]
        }),
    )
    .expect("translates");

    let Some(FieldType::Array(item)) = record.field("pages").map(|f| f.field_type()) else {
        panic!("pages should be an array");
    };
    assert!(matches!(item.as_ref(), FieldType::Record(inner) if inner.name() == "batch_pages"));

    let empty = record.instantiate(&json!({"pages": []})).expect("valid");
    assert_eq!(empty["pages"], json!([]));

    let missing_url = record.instantiate(&json!({"pages": [{}]})).unwrap_err();
    assert_eq!(
        missing_url,
        ValidationError::MissingField {
            path: "pages[0].url".to_string()
        }
    );
}

#[test]
fn references_resolve_against_sibling_properties() {
    let record = translate(
        "search",
        &json!({
            "properties": {
                "Filter": {
                    "type": "object",
                    "properties": {"tag": {"type": "string"}},
                    "required": ["tag"]
                },
                "filter": {"type": "object", "$ref": "#/properties/Filter"},
                "by_site": {
                    "type": "object",
                    "additionalProperties": {"$ref": "#/$defs/Filter"}
                }
            }
        }),
    )
    .expect("translates");

    assert!(matches!(
        record.field("filter").map(|f| f.field_type()),
        Some(FieldType::Record(inner)) if inner.name() == "search_filter"
    ));
    let Some(FieldType::Map(entry)) = record.field("by_site").map(|f| f.field_type()) else {
        panic!("by_site should be a map");
    };
    assert!(entry.field("tag").is_some());

    let bad = record
        .instantiate(&json!({"by_site": {"example.com": {"tag": 3}}}))
        .unwrap_err();
    assert!(
        matches!(bad, ValidationError::TypeMismatch { ref path, .. } if path == "by_site.example.com.tag")
    );
}

#[test]
fn unsupported_shapes_name_the_offending_field() {
    let null_kind = translate(
        "bad",
        &json!({"properties": {"nothing": {"type": "null"}}}),
    )
    .unwrap_err();
    assert!(
        matches!(null_kind, SchemaError::UnsupportedKind { ref field, ref kind } if field == "nothing" && kind == "null")
    );

    let no_items = translate("bad", &json!({"properties": {"list": {"type": "array"}}})).unwrap_err();
    assert!(matches!(no_items, SchemaError::MissingItemsType { .. }));
    assert_eq!(no_items.field(), "list");

    let bare_object =
        translate("bad", &json!({"properties": {"blob": {"type": "object"}}})).unwrap_err();
    assert!(matches!(bare_object, SchemaError::UnsupportedObject { .. }));

    let dangling = translate(
        "bad",
        &json!({"properties": {"link": {"type": "object", "$ref": "#/$defs/Missing"}}}),
    )
    .unwrap_err();
    assert!(
        matches!(dangling, SchemaError::UnresolvedReference { ref reference, .. } if reference == "#/$defs/Missing")
    );

    let not_object = translate("bad", &json!(["type", "object"])).unwrap_err();
    assert!(matches!(not_object, SchemaError::InvalidSchema { .. }));
}

#[test]
fn website_crawl_arguments_from_pydantic() {
    let schema = json!({
        "description": "Arguments for crawling a website",
        "properties": {
            "query": {"title": "Query", "type": "string"},
            "base_url": {"title": "Base Url", "type": "string"},
            "max_links": {"default": 100, "title": "Max Links", "type": "integer"}
        },
        "required": ["query", "base_url"],
        "title": "WebsiteCrawlArgs",
        "type": "object"
    });
    let record = translate("website_firecrawl", &schema).expect("translates");

    let required: Vec<&str> = record.required_fields().map(|field| field.name()).collect();
    assert_eq!(required, ["query", "base_url"]);

    let exported = record.to_json_schema();
    assert_eq!(exported["title"], "website_firecrawl");
    assert_eq!(exported["type"], "object");
    assert_eq!(exported["required"], json!(["query", "base_url"]));
    assert_eq!(exported["properties"]["max_links"]["default"], 100);

    let instance = record
        .instantiate(&json!({"query": "pricing", "base_url": "https://example.com"}))
        .expect("valid");
    assert_eq!(instance["max_links"], 100);
}

#[test]
fn translating_twice_yields_equal_records() {
    let schema = json!({
        "properties": {
            "q": {"type": "string"},
            "options": {"type": "object", "properties": {"n": {"type": "integer"}}}
        },
        "required": ["q"]
    });
    let first = translate("search", &schema).expect("translates");
    let second = translate("search", &schema).expect("translates");
    assert_eq!(first, second);
}
