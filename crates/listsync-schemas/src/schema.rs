//! Record schema definitions.
//!
//! A schema is the configuration data that turns the generic controller into
//! an "accounts" or "opportunities" screen: the fields the editor shows, how
//! each raw value is normalized, which fields are required in which mode, and
//! which columns the list renders.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use listsync_model::{DraftRecord, EditorMode, FieldValue, Record, RecordKind};

/// Input kind of a field. Decides its empty value, its normalization and its
/// format rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    TextArea,
    Phone,
    Email,
    Url,
    Picklist,
    Date,
    Number,
    Currency,
    Percent,
    /// Identifier of a related record.
    Reference,
    Checkbox,
}

impl FieldKind {
    /// The defined empty value shown for an absent or null raw value.
    pub fn empty_value(self) -> FieldValue {
        match self {
            Self::Checkbox => FieldValue::Flag(false),
            _ => FieldValue::empty_text(),
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Number | Self::Currency | Self::Percent)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::TextArea => "text_area",
            Self::Phone => "phone",
            Self::Email => "email",
            Self::Url => "url",
            Self::Picklist => "picklist",
            Self::Date => "date",
            Self::Number => "number",
            Self::Currency => "currency",
            Self::Percent => "percent",
            Self::Reference => "reference",
            Self::Checkbox => "checkbox",
        })
    }
}

/// When a field must be filled in before saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequiredWhen {
    #[default]
    Never,
    Always,
    /// Only when creating a new record.
    OnCreate,
}

impl RequiredWhen {
    pub fn applies(self, mode: EditorMode) -> bool {
        match self {
            Self::Never => false,
            Self::Always => !mode.is_read_only(),
            Self::OnCreate => mode == EditorMode::Create,
        }
    }
}

/// One editable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: RequiredWhen,
    /// Message shown when the required check fails.
    #[serde(default)]
    pub message: Option<String>,
    /// Allowed values of a picklist field.
    #[serde(default)]
    pub options: Vec<String>,
}

impl FieldSpec {
    pub fn required_message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("{} is required", self.label))
    }
}

/// One list column, addressed by a dotted path into the raw record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub label: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordSchema {
    pub kind: RecordKind,
    /// Singular display label, e.g. "Account".
    pub label: String,
    pub fields: Vec<FieldSpec>,
    pub columns: Vec<ColumnSpec>,
}

impl RecordSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Columns for the list view; defaults to one column per field.
    pub fn list_columns(&self) -> Vec<ColumnSpec> {
        if !self.columns.is_empty() {
            return self.columns.clone();
        }
        self.fields
            .iter()
            .map(|field| ColumnSpec {
                label: field.label.clone(),
                path: field.name.clone(),
            })
            .collect()
    }

    /// Fields that must be filled in for `mode`, in schema order.
    pub fn required_fields(&self, mode: EditorMode) -> impl Iterator<Item = &FieldSpec> {
        self.fields
            .iter()
            .filter(move |field| field.required.applies(mode))
    }

    /// A create-mode draft with every field set to its empty value.
    pub fn blank_draft(&self) -> DraftRecord {
        let fields: BTreeMap<String, FieldValue> = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.kind.empty_value()))
            .collect();
        DraftRecord::new(true, fields)
    }

    /// An edit/view draft populated from a fetched record.
    ///
    /// The result is total over the schema's fields; raw fields the schema
    /// does not declare are dropped.
    pub fn draft_from_record(&self, record: &Record) -> DraftRecord {
        let fields: BTreeMap<String, FieldValue> = self
            .fields
            .iter()
            .map(|field| {
                let value = crate::normalize::normalize_value(field.kind, record.get(&field.name));
                (field.name.clone(), value)
            })
            .collect();
        DraftRecord::new(false, fields)
    }
}
