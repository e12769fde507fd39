//! Conversions between raw service values and displayable draft values.

use serde_json::{Map, Number, Value};

use listsync_model::{DraftRecord, FieldValue};

use crate::schema::{FieldKind, RecordSchema};

/// Map a raw value (possibly absent) onto the displayable value for `kind`.
pub fn normalize_value(kind: FieldKind, raw: Option<&Value>) -> FieldValue {
    let Some(raw) = raw else {
        return kind.empty_value();
    };
    match (kind, raw) {
        (_, Value::Null) => kind.empty_value(),
        (FieldKind::Checkbox, Value::Bool(flag)) => FieldValue::Flag(*flag),
        (FieldKind::Checkbox, Value::String(text)) => {
            FieldValue::Flag(text.trim().eq_ignore_ascii_case("true"))
        }
        (FieldKind::Checkbox, _) => FieldValue::Flag(false),
        (_, Value::String(text)) => FieldValue::Text(text.clone()),
        (_, Value::Number(number)) => FieldValue::Text(number.to_string()),
        (_, Value::Bool(flag)) => FieldValue::Text(flag.to_string()),
        (_, other) => FieldValue::Text(other.to_string()),
    }
}

/// Parse decimal input the way the numeric fields accept it.
pub(crate) fn parse_decimal(text: &str) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Parse numeric input, keeping integers exact.
///
/// Integer text becomes an integer JSON number so that a stored `1200` is
/// sent back as `1200`, not `1200.0`.
fn parse_number(text: &str) -> Option<Number> {
    let text = text.trim();
    if let Ok(int) = text.parse::<i64>() {
        return Some(Number::from(int));
    }
    if let Ok(int) = text.parse::<u64>() {
        return Some(Number::from(int));
    }
    parse_decimal(text).and_then(Number::from_f64)
}

/// Convert one draft value into the typed value sent to the service.
///
/// Blank numeric, date and reference fields become `null`; other blank text
/// stays an empty string. Unparseable numbers also become `null`, which
/// validation rules out before a save. Values whose format is checked are
/// sent trimmed, as they were validated.
pub fn payload_value(kind: FieldKind, value: &FieldValue) -> Value {
    match (kind, value) {
        (FieldKind::Checkbox, value) => Value::Bool(!value.is_blank()),
        (_, FieldValue::Flag(flag)) => Value::String(flag.to_string()),
        (kind, FieldValue::Text(text)) if kind.is_numeric() => {
            parse_number(text).map_or(Value::Null, Value::Number)
        }
        (FieldKind::Date | FieldKind::Reference, FieldValue::Text(text)) if text.trim().is_empty() => {
            Value::Null
        }
        (FieldKind::Date | FieldKind::Picklist | FieldKind::Email, FieldValue::Text(text)) => {
            Value::String(text.trim().to_owned())
        }
        (_, FieldValue::Text(text)) => Value::String(text.clone()),
    }
}

/// Build the field map handed to the create/update collaborator.
pub fn payload(schema: &RecordSchema, draft: &DraftRecord) -> Map<String, Value> {
    schema
        .fields
        .iter()
        .map(|field| {
            let value = draft
                .get(&field.name)
                .map_or(Value::Null, |value| payload_value(field.kind, value));
            (field.name.clone(), value)
        })
        .collect()
}
