//! Reshapes the schema's repeated event sub-objects into a canonical
//! list-of-objects form.
//!
//! The source API is inconsistent about how it represents event histories: a
//! field may arrive as null, an empty array, a single object, or an array of
//! objects. Everything funnels through here so the tolerance lives in one
//! place; downstream of this module an event field is always null or an
//! ordered array of uniform items.

use serde_json::{Map, Value};

use crate::normalize::coerce;
use crate::normalize::validate::{ProblemCode, ValidationReport};
use crate::schema::EventKind;

/// Normalize a raw event-history value for `field`.
///
/// A wholly absent field stays null; a present-but-empty sequence becomes an
/// empty array. Source order is preserved, and items that are not
/// recognizable event objects are dropped with a `malformed_event_item`
/// entry. Feeding an already-normalized value back through yields the
/// identical value.
pub fn normalize_events(
    raw: Option<&Value>,
    kind: EventKind,
    field: &str,
    report: &mut ValidationReport,
) -> Value {
    let Some(value) = raw else {
        return Value::Null;
    };
    match value {
        Value::Null => Value::Null,
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter_map(|item| normalize_item(item, kind, field, report))
                .collect(),
        ),
        // A single bare object is a one-element history
        Value::Object(_) => match normalize_item(value, kind, field, report) {
            Some(item) => Value::Array(vec![item]),
            None => Value::Array(Vec::new()),
        },
        _ => {
            report.record(field, ProblemCode::TypeMismatch);
            Value::Null
        }
    }
}

fn normalize_item(
    item: &Value,
    kind: EventKind,
    field: &str,
    report: &mut ValidationReport,
) -> Option<Value> {
    let Some(obj) = item.as_object() else {
        report.record(field, ProblemCode::MalformedEventItem);
        return None;
    };

    let mut normalized = Map::new();
    match kind {
        EventKind::UrlFlag => {
            normalized.insert(
                "url".to_string(),
                item_string(obj.get("url"), field, report),
            );
            normalized.insert(
                "value".to_string(),
                item_boolean(obj.get("value"), field, report),
            );
        }
        EventKind::IdTimestamp => {
            normalized.insert("id".to_string(), item_string(obj.get("id"), field, report));
            normalized.insert(
                "timestamp".to_string(),
                coerce::coerce_timestamp(obj.get("timestamp"), field, report),
            );
        }
    }
    Some(Value::Object(normalized))
}

fn item_string(raw: Option<&Value>, field: &str, report: &mut ValidationReport) -> Value {
    match raw {
        None | Some(Value::Null) => Value::Null,
        Some(value) => match coerce::string_from_value(value) {
            Some(s) => Value::String(s),
            None => {
                report.record(field, ProblemCode::MalformedEventItem);
                Value::Null
            }
        },
    }
}

fn item_boolean(raw: Option<&Value>, field: &str, report: &mut ValidationReport) -> Value {
    match raw {
        None | Some(Value::Null) => Value::Null,
        Some(value) => match coerce::boolean_from_value(value) {
            Some(b) => Value::Bool(b),
            None => {
                report.record(field, ProblemCode::MalformedEventItem);
                Value::Null
            }
        },
    }
}
