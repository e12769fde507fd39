//! Editable drafts.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which workflow the editor was opened for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    Create,
    Edit,
    View,
}

impl EditorMode {
    pub fn is_read_only(self) -> bool {
        matches!(self, Self::View)
    }

    /// Edit and View address an existing record; Create does not.
    pub fn needs_record_id(self) -> bool {
        !matches!(self, Self::Create)
    }
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::View => "view",
        })
    }
}

/// The displayable value of one draft field.
///
/// Drafts never hold an "absent" value: every field has either text (possibly
/// empty) or a flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

impl FieldValue {
    pub fn empty_text() -> Self {
        Self::Text(String::new())
    }

    /// True for whitespace-only text and for an unset flag.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Flag(flag) => !flag,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Flag(_) => None,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::empty_text()
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Flag(flag) => write!(f, "{flag}"),
        }
    }
}

/// The in-progress field map behind an open editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftRecord {
    pub is_new: bool,
    pub fields: BTreeMap<String, FieldValue>,
}

impl DraftRecord {
    pub fn new(is_new: bool, fields: BTreeMap<String, FieldValue>) -> Self {
        Self { is_new, fields }
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Overwrite one field. Returns the previous value, `None` when the field
    /// is not part of this draft (in which case nothing is inserted).
    pub fn set(&mut self, field: &str, value: FieldValue) -> Option<FieldValue> {
        self.fields
            .get_mut(field)
            .map(|slot| std::mem::replace(slot, value))
    }

    pub fn is_blank(&self, field: &str) -> bool {
        self.fields.get(field).is_none_or(FieldValue::is_blank)
    }

    /// True when every field holds its blank value.
    pub fn is_pristine(&self) -> bool {
        self.fields.values().all(FieldValue::is_blank)
    }
}
