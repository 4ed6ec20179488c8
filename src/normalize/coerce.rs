//! Best-effort conversion of raw API values into their declared types.
//!
//! Marketing APIs routinely send absent, null, or oddly typed fields; a
//! coercion failure nulls the field and records a problem instead of failing
//! the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::normalize::validate::{ProblemCode, ValidationReport};
use crate::schema::ScalarKind;

/// Parse an ISO-8601 date-time string, accepting timezone-aware and
/// timezone-naive forms. Naive inputs are interpreted as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Canonical wire form for timestamps: RFC 3339 in UTC.
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Interpret a raw value as a string, converting primitives where sensible.
pub fn string_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Interpret a raw value as a boolean, accepting the usual string and
/// numeric encodings.
pub fn boolean_from_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" => Some(true),
            "false" | "f" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}

/// Coerce a raw scalar to its declared kind.
///
/// Absent or null input is null regardless of the kind; a value that cannot
/// be converted is nulled with a `type_mismatch` entry in the report.
pub fn coerce_scalar(
    raw: Option<&Value>,
    kind: ScalarKind,
    field: &str,
    report: &mut ValidationReport,
) -> Value {
    let Some(value) = raw else {
        return Value::Null;
    };
    if value.is_null() {
        return Value::Null;
    }

    let coerced = match kind {
        ScalarKind::String => string_from_value(value).map(Value::String),
        ScalarKind::Boolean => boolean_from_value(value).map(Value::Bool),
    };
    match coerced {
        Some(v) => v,
        None => {
            report.record(field, ProblemCode::TypeMismatch);
            Value::Null
        }
    }
}

/// Coerce a raw value to a canonical timestamp string.
///
/// Unparsable strings null the field with an `invalid_timestamp` entry;
/// non-string values are a `type_mismatch`.
pub fn coerce_timestamp(raw: Option<&Value>, field: &str, report: &mut ValidationReport) -> Value {
    let Some(value) = raw else {
        return Value::Null;
    };
    match value {
        Value::Null => Value::Null,
        Value::String(s) => match parse_timestamp(s) {
            Some(dt) => Value::String(format_timestamp(dt)),
            None => {
                report.record(field, ProblemCode::InvalidTimestamp);
                Value::Null
            }
        },
        _ => {
            report.record(field, ProblemCode::TypeMismatch);
            Value::Null
        }
    }
}

/// Pass an unstructured sequence through without a per-item schema.
pub fn coerce_raw_list(raw: Option<&Value>, field: &str, report: &mut ValidationReport) -> Value {
    let Some(value) = raw else {
        return Value::Null;
    };
    match value {
        Value::Null => Value::Null,
        Value::Array(_) => value.clone(),
        _ => {
            report.record(field, ProblemCode::TypeMismatch);
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_accepts_aware_and_naive_forms() {
        let aware = parse_timestamp("2021-01-01T00:00:00Z").unwrap();
        let offset = parse_timestamp("2021-01-01T02:00:00+02:00").unwrap();
        let naive = parse_timestamp("2021-01-01T00:00:00").unwrap();
        let date_only = parse_timestamp("2021-01-01").unwrap();

        assert_eq!(aware, offset);
        assert_eq!(aware, naive);
        assert_eq!(aware, date_only);
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("not-a-date").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2021-13-40T99:00:00Z").is_none());
    }

    #[test]
    fn test_format_timestamp_is_a_fixpoint() {
        let formatted = format_timestamp(parse_timestamp("2021-06-01T12:30:00+02:00").unwrap());
        assert_eq!(formatted, "2021-06-01T10:30:00Z");
        let reparsed = format_timestamp(parse_timestamp(&formatted).unwrap());
        assert_eq!(formatted, reparsed);
    }

    #[test]
    fn test_coerce_scalar_absent_and_null_become_null() {
        let mut report = ValidationReport::default();
        assert_eq!(
            coerce_scalar(None, ScalarKind::String, "name", &mut report),
            Value::Null
        );
        assert_eq!(
            coerce_scalar(Some(&Value::Null), ScalarKind::Boolean, "flag", &mut report),
            Value::Null
        );
        assert!(report.is_empty());
    }

    #[test]
    fn test_coerce_scalar_string_conversions() {
        let mut report = ValidationReport::default();
        assert_eq!(
            coerce_scalar(Some(&json!("hi")), ScalarKind::String, "name", &mut report),
            json!("hi")
        );
        assert_eq!(
            coerce_scalar(Some(&json!(7)), ScalarKind::String, "name", &mut report),
            json!("7")
        );
        assert!(report.is_empty());

        assert_eq!(
            coerce_scalar(Some(&json!({"a": 1})), ScalarKind::String, "name", &mut report),
            Value::Null
        );
        assert_eq!(report.problems().len(), 1);
        assert_eq!(report.problems()[0].code, ProblemCode::TypeMismatch);
    }

    #[test]
    fn test_coerce_scalar_boolean_conversions() {
        let mut report = ValidationReport::default();
        assert_eq!(
            coerce_scalar(Some(&json!(true)), ScalarKind::Boolean, "f", &mut report),
            json!(true)
        );
        assert_eq!(
            coerce_scalar(Some(&json!("True")), ScalarKind::Boolean, "f", &mut report),
            json!(true)
        );
        assert_eq!(
            coerce_scalar(Some(&json!("0")), ScalarKind::Boolean, "f", &mut report),
            json!(false)
        );
        assert_eq!(
            coerce_scalar(Some(&json!(1)), ScalarKind::Boolean, "f", &mut report),
            json!(true)
        );
        assert!(report.is_empty());

        assert_eq!(
            coerce_scalar(Some(&json!("maybe")), ScalarKind::Boolean, "f", &mut report),
            Value::Null
        );
        assert_eq!(report.problems().len(), 1);
    }

    #[test]
    fn test_coerce_timestamp_invalid_records_problem() {
        let mut report = ValidationReport::default();
        let value = coerce_timestamp(Some(&json!("not-a-date")), "created_at", &mut report);
        assert_eq!(value, Value::Null);
        assert_eq!(report.problems().len(), 1);
        assert_eq!(report.problems()[0].field, "created_at");
        assert_eq!(report.problems()[0].code, ProblemCode::InvalidTimestamp);
    }

    #[test]
    fn test_coerce_raw_list_passes_arrays_through() {
        let mut report = ValidationReport::default();
        let raw = json!(["list_a", "list_b"]);
        assert_eq!(coerce_raw_list(Some(&raw), "lists", &mut report), raw);
        assert_eq!(coerce_raw_list(None, "lists", &mut report), Value::Null);
        assert!(report.is_empty());

        assert_eq!(
            coerce_raw_list(Some(&json!("solo")), "lists", &mut report),
            Value::Null
        );
        assert_eq!(report.problems().len(), 1);
    }
}
