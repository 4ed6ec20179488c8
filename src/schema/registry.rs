use serde_json::{json, Value};

use super::{definitions, Schema};
use crate::error::{Result, TapError};

/// Registry of record-type schemas, loaded once at startup.
///
/// The registry is read-only after construction; callers share it behind an
/// `Arc` and look schemas up per record without any locking.
pub struct SchemaRegistry {
    schemas: Vec<Schema>,
}

impl SchemaRegistry {
    /// Create a registry with every stream schema the tap serves.
    pub fn new() -> Self {
        Self {
            schemas: vec![
                definitions::contacts(),
                definitions::lists(),
                definitions::lists_contacts(),
                definitions::smart_segments(),
                definitions::smart_segments_contacts(),
            ],
        }
    }

    /// Look up the schema for a record type.
    pub fn get_schema(&self, record_type: &str) -> Result<&Schema> {
        self.schemas
            .iter()
            .find(|s| s.stream == record_type)
            .ok_or_else(|| TapError::UnknownSchema(record_type.to_string()))
    }

    /// Registered stream names, in catalog order.
    pub fn stream_names(&self) -> Vec<&'static str> {
        self.schemas.iter().map(|s| s.stream).collect()
    }

    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    /// Discovery catalog: every stream with its schema document, each
    /// property marked for automatic inclusion.
    pub fn catalog(&self) -> Value {
        let streams: Vec<Value> = self
            .schemas
            .iter()
            .map(|schema| {
                let mut doc = schema.to_json_schema();
                if let Some(properties) = doc["properties"].as_object_mut() {
                    for (_, prop) in properties.iter_mut() {
                        prop["inclusion"] = json!("automatic");
                    }
                }
                json!({
                    "stream": schema.stream,
                    "tap_stream_id": schema.stream,
                    "key_properties": schema.key_properties,
                    "schema": doc,
                })
            })
            .collect();
        json!({ "streams": streams })
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_built_in_schemas() {
        let registry = SchemaRegistry::new();

        let streams = registry.stream_names();
        assert!(streams.contains(&"contacts"));
        assert!(streams.contains(&"lists"));
        assert!(streams.contains(&"lists_contacts"));
        assert!(streams.contains(&"smart_segments"));
        assert!(streams.contains(&"smart_segments_contacts"));
    }

    #[test]
    fn test_registry_returns_error_for_unknown_type() {
        let registry = SchemaRegistry::new();

        let result = registry.get_schema("invoices");
        assert!(matches!(result, Err(TapError::UnknownSchema(ref t)) if t == "invoices"));
    }

    #[test]
    fn test_catalog_lists_streams_in_registration_order() {
        let registry = SchemaRegistry::new();

        let catalog = registry.catalog();
        let streams = catalog["streams"].as_array().unwrap();
        assert_eq!(streams.len(), 5);
        assert_eq!(streams[0]["stream"], "contacts");
        assert_eq!(
            streams[0]["schema"]["properties"]["email"]["inclusion"],
            "automatic"
        );
        assert_eq!(streams[1]["key_properties"][0], "list_id");
    }
}
