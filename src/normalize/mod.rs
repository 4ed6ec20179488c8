pub mod coerce;
pub mod events;
pub mod validate;

pub use validate::{Problem, ProblemCode, ValidationReport};

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Result;
use crate::schema::{FieldSpec, SchemaRegistry};

/// A record normalized to its declared schema shape.
///
/// Every field the schema declares is present, with explicit nulls for
/// absent source data; nothing undeclared is carried over.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub stream: String,
    pub record: Map<String, Value>,
}

impl NormalizedRecord {
    pub fn into_value(self) -> Value {
        Value::Object(self.record)
    }
}

/// Normalization pipeline: raw payload in, schema-conformant record plus
/// validation report out.
///
/// Stateless per invocation; the only shared state is the immutable schema
/// registry, so independent payloads can be normalized concurrently.
pub struct RecordNormalizer {
    registry: Arc<SchemaRegistry>,
}

impl RecordNormalizer {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Normalize one raw payload for the given record type.
    ///
    /// Fails only when the record type has no registered schema; every
    /// per-field data problem lands in the returned report instead, so one
    /// malformed payload never aborts a batch.
    pub fn normalize(
        &self,
        raw: &Value,
        record_type: &str,
    ) -> Result<(NormalizedRecord, ValidationReport)> {
        let schema = self.registry.get_schema(record_type)?;

        let empty = Map::new();
        let source = match raw.as_object() {
            Some(obj) => obj,
            None => {
                warn!(
                    stream = record_type,
                    "raw payload is not an object; emitting all-null record"
                );
                &empty
            }
        };

        let mut report = ValidationReport::default();
        let mut record = Map::new();
        for field in &schema.fields {
            let raw_value = source.get(field.name);
            let value = match field.spec {
                FieldSpec::Scalar(kind) => {
                    coerce::coerce_scalar(raw_value, kind, field.name, &mut report)
                }
                FieldSpec::Timestamp => coerce::coerce_timestamp(raw_value, field.name, &mut report),
                FieldSpec::EventList(kind) => {
                    events::normalize_events(raw_value, kind, field.name, &mut report)
                }
                FieldSpec::RawList => coerce::coerce_raw_list(raw_value, field.name, &mut report),
            };
            record.insert(field.name.to_string(), value);
        }

        report.merge(validate::validate(&record, schema));

        Ok((
            NormalizedRecord {
                stream: schema.stream.to_string(),
                record,
            },
            report,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TapError;
    use serde_json::json;

    fn normalizer() -> RecordNormalizer {
        RecordNormalizer::new(Arc::new(SchemaRegistry::new()))
    }

    #[test]
    fn test_normalize_fills_every_declared_field() {
        let normalizer = normalizer();
        let raw = json!({"email": "a@b.com"});

        let (normalized, report) = normalizer.normalize(&raw, "contacts").unwrap();
        assert!(report.is_empty());
        assert_eq!(normalized.record.len(), 28);
        assert_eq!(normalized.record["email"], json!("a@b.com"));
        assert_eq!(normalized.record["contact_id"], Value::Null);
        assert_eq!(normalized.record["mail_opened"], Value::Null);
    }

    #[test]
    fn test_normalize_drops_undeclared_fields() {
        let normalizer = normalizer();
        let raw = json!({"email": "a@b.com", "custom_field": "surprise"});

        let (normalized, _) = normalizer.normalize(&raw, "contacts").unwrap();
        assert!(!normalized.record.contains_key("custom_field"));
    }

    #[test]
    fn test_normalize_unknown_type_is_an_error() {
        let normalizer = normalizer();
        let result = normalizer.normalize(&json!({}), "invoices");
        assert!(matches!(result, Err(TapError::UnknownSchema(ref t)) if t == "invoices"));
    }

    #[test]
    fn test_normalize_collects_problems_without_aborting() {
        let normalizer = normalizer();
        let raw = json!({
            "email": "a@b.com",
            "created_at": "not-a-date",
            "mail_opened": [{"id": "1", "timestamp": "also-not-a-date"}, 3],
        });

        let (normalized, report) = normalizer.normalize(&raw, "contacts").unwrap();
        assert_eq!(normalized.record["email"], json!("a@b.com"));
        assert_eq!(normalized.record["created_at"], Value::Null);
        assert_eq!(
            normalized.record["mail_opened"],
            json!([{"id": "1", "timestamp": null}])
        );

        let codes: Vec<_> = report.problems().iter().map(|p| (p.field.as_str(), p.code)).collect();
        assert!(codes.contains(&("created_at", ProblemCode::InvalidTimestamp)));
        assert!(codes.contains(&("mail_opened", ProblemCode::InvalidTimestamp)));
        assert!(codes.contains(&("mail_opened", ProblemCode::MalformedEventItem)));
        assert_eq!(codes.len(), 3);
    }

    #[test]
    fn test_normalize_is_idempotent_at_the_record_level() {
        let normalizer = normalizer();
        let raw = json!({
            "contact_id": "person_1",
            "created_at": "2021-01-01T00:00:00",
            "lists": ["contactlist_1"],
            "anywhere_utm": {"url": "x", "value": "1"},
            "mail_opened": [{"id": "1", "timestamp": "2021-01-01"}],
        });

        let (once, first_report) = normalizer.normalize(&raw, "contacts").unwrap();
        let (twice, second_report) = normalizer
            .normalize(&once.clone().into_value(), "contacts")
            .unwrap();
        assert_eq!(once, twice);
        assert!(first_report.is_empty());
        assert!(second_report.is_empty());
    }
}
