//! Required-field and format checks for drafts.

use chrono::NaiveDate;

use listsync_model::{DraftRecord, EditorMode, FieldFailure, FieldValue, ValidationResult};

use crate::normalize::parse_decimal;
use crate::schema::{FieldKind, FieldSpec, RecordSchema};

/// Date format accepted by date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate `draft` against the rules `schema` declares for `mode`.
///
/// Fields are checked in schema order and each field contributes at most one
/// failure, so the first failure is the one the user should fix first. View
/// mode has no rules.
pub fn validate_draft(schema: &RecordSchema, draft: &DraftRecord, mode: EditorMode) -> ValidationResult {
    if mode.is_read_only() {
        return ValidationResult::passed();
    }
    let failures = schema
        .fields
        .iter()
        .filter_map(|field| check_field(field, draft.get(&field.name), mode))
        .collect();
    ValidationResult::from_failures(failures)
}

fn check_field(field: &FieldSpec, value: Option<&FieldValue>, mode: EditorMode) -> Option<FieldFailure> {
    let blank = value.is_none_or(FieldValue::is_blank);
    if blank {
        return field
            .required
            .applies(mode)
            .then(|| FieldFailure::new(&field.name, field.required_message()));
    }
    let text = value.and_then(FieldValue::as_text)?.trim();
    check_format(field, text).map(|message| FieldFailure::new(&field.name, message))
}

fn check_format(field: &FieldSpec, text: &str) -> Option<String> {
    match field.kind {
        kind if kind.is_numeric() => {
            parse_decimal(text)
                .is_none()
                .then(|| format!("{} must be a number", field.label))
        }
        FieldKind::Date => NaiveDate::parse_from_str(text, DATE_FORMAT)
            .is_err()
            .then(|| format!("{} must be a date (YYYY-MM-DD)", field.label)),
        FieldKind::Picklist => (!field.options.iter().any(|option| option == text))
            .then(|| format!("{} must be one of the listed values", field.label)),
        FieldKind::Email => (!looks_like_email(text))
            .then(|| format!("{} must be an email address", field.label)),
        _ => None,
    }
}

fn looks_like_email(text: &str) -> bool {
    match text.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("ada@example.com"));
        assert!(!looks_like_email("ada@localhost"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("ada.example.com"));
    }
}
