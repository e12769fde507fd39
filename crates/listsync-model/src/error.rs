use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("invalid record kind: {0:?}")]
    InvalidRecordKind(String),
    #[error("invalid record id: {0:?}")]
    InvalidRecordId(String),
    #[error("record is missing its `{field}` identifier field")]
    MissingId { field: &'static str },
    #[error("record must be a JSON object")]
    NotAnObject,
}

pub type Result<T> = std::result::Result<T, ModelError>;
