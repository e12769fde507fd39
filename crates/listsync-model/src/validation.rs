use std::fmt;

use serde::{Deserialize, Serialize};

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFailure {
    pub field: String,
    pub message: String,
}

impl FieldFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a draft; failures keep schema field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub failures: Vec<FieldFailure>,
}

impl ValidationResult {
    pub fn from_failures(failures: Vec<FieldFailure>) -> Self {
        Self {
            ok: failures.is_empty(),
            failures,
        }
    }

    pub fn passed() -> Self {
        Self::from_failures(Vec::new())
    }

    /// The failure surfaced to the user.
    pub fn first_failure(&self) -> Option<&FieldFailure> {
        self.failures.first()
    }

    pub fn failed_fields(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|failure| failure.field.as_str())
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ok {
            return f.write_str("ok");
        }
        for (index, failure) in self.failures.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}: {}", failure.field, failure.message)?;
        }
        Ok(())
    }
}
