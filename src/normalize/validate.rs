use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::normalize::coerce;
use crate::schema::{EventKind, FieldSpec, ScalarKind, Schema};

/// Per-field conformance problem codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemCode {
    InvalidTimestamp,
    MalformedEventItem,
    TypeMismatch,
}

impl ProblemCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemCode::InvalidTimestamp => "invalid_timestamp",
            ProblemCode::MalformedEventItem => "malformed_event_item",
            ProblemCode::TypeMismatch => "type_mismatch",
        }
    }
}

impl fmt::Display for ProblemCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One conformance failure, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    pub field: String,
    pub code: ProblemCode,
}

/// Advisory, per-record list of conformance problems.
///
/// Producing a report never blocks the normalized record; the caller decides
/// whether problems are logged, alerted on, or (in strict mode) fatal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    problems: Vec<Problem>,
}

impl ValidationReport {
    /// Record a problem, keeping one entry per distinct (field, code) pair.
    pub fn record(&mut self, field: &str, code: ProblemCode) {
        if !self.problems.iter().any(|p| p.field == field && p.code == code) {
            self.problems.push(Problem {
                field: field.to_string(),
                code,
            });
        }
    }

    pub fn merge(&mut self, other: ValidationReport) {
        for problem in other.problems {
            self.record(&problem.field, problem.code);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }
}

/// Check a normalized record against its schema.
///
/// Purely observational: the record is never mutated, and a failing field
/// produces a report entry rather than an error.
pub fn validate(record: &Map<String, Value>, schema: &Schema) -> ValidationReport {
    let mut report = ValidationReport::default();

    for field in &schema.fields {
        let value = record.get(field.name).unwrap_or(&Value::Null);
        match field.spec {
            FieldSpec::Scalar(kind) => validate_scalar(value, kind, field.name, &mut report),
            FieldSpec::Timestamp => validate_timestamp(value, field.name, &mut report),
            FieldSpec::EventList(kind) => validate_events(value, kind, field.name, &mut report),
            FieldSpec::RawList => {
                if !value.is_null() && !value.is_array() {
                    report.record(field.name, ProblemCode::TypeMismatch);
                }
            }
        }
    }

    report
}

fn validate_scalar(value: &Value, kind: ScalarKind, field: &str, report: &mut ValidationReport) {
    let conforms = match kind {
        ScalarKind::String => value.is_null() || value.is_string(),
        ScalarKind::Boolean => value.is_null() || value.is_boolean(),
    };
    if !conforms {
        report.record(field, ProblemCode::TypeMismatch);
    }
}

fn validate_timestamp(value: &Value, field: &str, report: &mut ValidationReport) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            if coerce::parse_timestamp(s).is_none() {
                report.record(field, ProblemCode::InvalidTimestamp);
            }
        }
        _ => report.record(field, ProblemCode::TypeMismatch),
    }
}

fn validate_events(value: &Value, kind: EventKind, field: &str, report: &mut ValidationReport) {
    let items = match value {
        Value::Null => return,
        Value::Array(items) => items,
        _ => {
            report.record(field, ProblemCode::TypeMismatch);
            return;
        }
    };

    for item in items {
        let Some(obj) = item.as_object() else {
            report.record(field, ProblemCode::MalformedEventItem);
            continue;
        };
        match kind {
            EventKind::UrlFlag => {
                let url_ok = obj.get("url").map_or(true, |v| v.is_null() || v.is_string());
                let value_ok = obj
                    .get("value")
                    .map_or(true, |v| v.is_null() || v.is_boolean());
                if !url_ok || !value_ok {
                    report.record(field, ProblemCode::MalformedEventItem);
                }
            }
            EventKind::IdTimestamp => {
                let id_ok = obj.get("id").map_or(true, |v| v.is_null() || v.is_string());
                if !id_ok {
                    report.record(field, ProblemCode::MalformedEventItem);
                }
                match obj.get("timestamp") {
                    None | Some(Value::Null) => {}
                    Some(Value::String(s)) => {
                        if coerce::parse_timestamp(s).is_none() {
                            report.record(field, ProblemCode::InvalidTimestamp);
                        }
                    }
                    Some(_) => report.record(field, ProblemCode::MalformedEventItem),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::definitions;
    use serde_json::json;

    fn record_from(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_validate_passes_conforming_record() {
        let schema = definitions::contacts();
        let record = record_from(json!({
            "contact_id": "person_1",
            "email": "a@b.com",
            "created_at": "2021-01-01T00:00:00Z",
            "mail_opened": [{"id": "1", "timestamp": "2021-01-01T00:00:00Z"}],
            "anywhere_utm": [{"url": "x", "value": null}],
        }));

        let report = validate(&record, &schema);
        assert!(report.is_empty(), "unexpected problems: {:?}", report.problems());
    }

    #[test]
    fn test_validate_flags_invalid_timestamp() {
        let schema = definitions::contacts();
        let record = record_from(json!({"created_at": "not-a-date"}));

        let report = validate(&record, &schema);
        assert_eq!(report.problems().len(), 1);
        assert_eq!(report.problems()[0].field, "created_at");
        assert_eq!(report.problems()[0].code, ProblemCode::InvalidTimestamp);
    }

    #[test]
    fn test_validate_flags_non_object_event_item() {
        let schema = definitions::contacts();
        let record = record_from(json!({"mail_opened": ["oops"]}));

        let report = validate(&record, &schema);
        assert_eq!(report.problems().len(), 1);
        assert_eq!(report.problems()[0].code, ProblemCode::MalformedEventItem);
    }

    #[test]
    fn test_validate_flags_scalar_type_mismatch() {
        let schema = definitions::contacts();
        let record = record_from(json!({"email": 42}));

        let report = validate(&record, &schema);
        assert_eq!(report.problems().len(), 1);
        assert_eq!(report.problems()[0].field, "email");
        assert_eq!(report.problems()[0].code, ProblemCode::TypeMismatch);
    }

    #[test]
    fn test_report_dedupes_distinct_problems() {
        let mut report = ValidationReport::default();
        report.record("created_at", ProblemCode::InvalidTimestamp);
        report.record("created_at", ProblemCode::InvalidTimestamp);
        report.record("created_at", ProblemCode::TypeMismatch);

        assert_eq!(report.problems().len(), 2);
    }
}
