//! Controller error taxonomy.
//!
//! None of these escape the orchestrator: every flow catches its failure at
//! the flow boundary and turns it into a notification. They are public so the
//! lower-level components can be driven and tested on their own.

use thiserror::Error;

use listsync_model::{RecordId, RecordKind, ValidationResult};

/// Failure reported by the external record service.
///
/// The message is shown to the user verbatim, so it is never rewritten.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Selection-count violation raised before the editor opens.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionError {
    #[error("none-selected")]
    NoneSelected,
    #[error("multiple-selected")]
    MultipleSelected { count: usize },
}

impl PreconditionError {
    /// Stable tag naming the violated precondition.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::NoneSelected => "none-selected",
            Self::MultipleSelected { .. } => "multiple-selected",
        }
    }
}

/// The record addressed by an edit or view disappeared before it loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} record {id} was not found")]
pub struct NotFoundError {
    pub kind: RecordKind,
    pub id: RecordId,
}

/// Local required-field or format violation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", first_message(.0))]
pub struct ValidationError(pub ValidationResult);

fn first_message(result: &ValidationResult) -> &str {
    result
        .first_failure()
        .map_or("validation failed", |failure| failure.message.as_str())
}

/// Why an editor could not load its record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error(transparent)]
    NotFound(#[from] NotFoundError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Misuse of the editor by the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EditorError {
    #[error("no editor is open")]
    NotOpen,
    #[error("an editor is already open")]
    AlreadyOpen,
    #[error("{mode} mode needs a record id")]
    MissingRecordId { mode: listsync_model::EditorMode },
    #[error("unknown field `{field}`")]
    UnknownField { field: String },
    #[error("the editor is read-only")]
    ReadOnly,
    #[error("the record is still loading")]
    Loading,
    #[error(transparent)]
    Load(#[from] LoadError),
}
