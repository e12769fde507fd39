//! Shared types for the list-edit synchronization controller.
//!
//! Records come from an external service as loosely-typed JSON objects. The
//! editor never exposes them directly; it works on a [`DraftRecord`] whose
//! fields always hold a displayable [`FieldValue`].

pub mod draft;
pub mod error;
pub mod ids;
pub mod notification;
pub mod record;
pub mod validation;

pub use draft::{DraftRecord, EditorMode, FieldValue};
pub use error::{ModelError, Result};
pub use ids::{RecordId, RecordKind};
pub use notification::{Notification, Severity};
pub use record::{ID_FIELD, Record, display_value};
pub use validation::{FieldFailure, ValidationResult};
