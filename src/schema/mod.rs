pub mod definitions;
pub mod registry;

pub use registry::SchemaRegistry;

use serde_json::{json, Map, Value};

/// Scalar kinds a declared field can take. Every field is nullable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Boolean,
}

/// Shape of the repeated sub-objects inside an event-list field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Page visits, UTM captures, form submits: `{url, value}` pairs
    UrlFlag,
    /// Mail engagement events: `{id, timestamp}` pairs
    IdTimestamp,
}

/// Declared shape of a single field, resolved once at schema load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    Scalar(ScalarKind),
    /// ISO-8601 date-time string
    Timestamp,
    EventList(EventKind),
    /// Unstructured sequence passed through without a per-item schema
    RawList,
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: &'static str,
    pub spec: FieldSpec,
}

/// A named, versionless structural description of one record type.
///
/// Field order is declaration order; the registry builds each schema once at
/// startup and never mutates it afterwards.
#[derive(Debug, Clone)]
pub struct Schema {
    pub stream: &'static str,
    pub key_properties: &'static [&'static str],
    pub fields: Vec<FieldDef>,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Renders the schema as the JSON-schema document surfaced to downstream
    /// consumers in SCHEMA messages and discovery output.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(field.name.to_string(), field_json_schema(field.spec));
        }
        json!({
            "type": "object",
            "properties": Value::Object(properties),
        })
    }
}

fn field_json_schema(spec: FieldSpec) -> Value {
    match spec {
        FieldSpec::Scalar(ScalarKind::String) => json!({"type": ["null", "string"]}),
        FieldSpec::Scalar(ScalarKind::Boolean) => json!({"type": ["null", "boolean"]}),
        FieldSpec::Timestamp => json!({"type": ["null", "string"], "format": "date-time"}),
        FieldSpec::EventList(kind) => json!({
            "type": ["null", "array"],
            "items": event_item_json_schema(kind),
        }),
        FieldSpec::RawList => json!({"type": ["null", "array"]}),
    }
}

fn event_item_json_schema(kind: EventKind) -> Value {
    match kind {
        EventKind::UrlFlag => json!({
            "type": "object",
            "properties": {
                "url": {"type": ["null", "string"]},
                "value": {"type": ["null", "boolean"]},
            },
        }),
        EventKind::IdTimestamp => json!({
            "type": "object",
            "properties": {
                "id": {"type": ["null", "string"]},
                "timestamp": {"type": ["null", "string"], "format": "date-time"},
            },
        }),
    }
}
