//! Notification wording.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by the schema's singular label.
pub const LABEL_PLACEHOLDER: &str = "{label}";

/// Titles and message templates for the notifications the controller emits.
///
/// Templates may contain `{label}`, which is replaced by the record type's
/// label ("Account", "Opportunity", ...). Upstream error messages are never
/// templated; they are shown as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    pub success_title: String,
    pub warning_title: String,
    pub error_title: String,
    pub created: String,
    pub updated: String,
    pub refreshed: String,
    pub refresh_failed: String,
    pub none_selected: String,
    pub multiple_selected: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            success_title: "Success".to_string(),
            warning_title: "Warning".to_string(),
            error_title: "Error".to_string(),
            created: "{label} created".to_string(),
            updated: "{label} updated".to_string(),
            refreshed: "Refreshed".to_string(),
            refresh_failed: "Refresh failed".to_string(),
            none_selected: "Select one {label}".to_string(),
            multiple_selected: "Select only one {label}".to_string(),
        }
    }
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the message shown after a successful refresh.
    #[must_use]
    pub fn with_refreshed(mut self, message: impl Into<String>) -> Self {
        self.refreshed = message.into();
        self
    }

    /// Set the message shown when a refresh fails.
    #[must_use]
    pub fn with_refresh_failed(mut self, message: impl Into<String>) -> Self {
        self.refresh_failed = message.into();
        self
    }

    /// Set the warnings shown when zero or several records are selected.
    #[must_use]
    pub fn with_selection_warnings(
        mut self,
        none_selected: impl Into<String>,
        multiple_selected: impl Into<String>,
    ) -> Self {
        self.none_selected = none_selected.into();
        self.multiple_selected = multiple_selected.into();
        self
    }

    /// Set the messages shown after a create or update succeeds.
    #[must_use]
    pub fn with_saved_messages(
        mut self,
        created: impl Into<String>,
        updated: impl Into<String>,
    ) -> Self {
        self.created = created.into();
        self.updated = updated.into();
        self
    }

    /// Expand `{label}` in a template.
    pub fn render(template: &str, label: &str) -> String {
        template.replace(LABEL_PLACEHOLDER, label)
    }
}
