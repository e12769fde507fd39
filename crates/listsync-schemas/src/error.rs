#![deny(unsafe_code)]

use std::path::PathBuf;

use listsync_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read schema file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML schema {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid record kind in {path}: {source}")]
    InvalidKind {
        path: PathBuf,
        #[source]
        source: ModelError,
    },

    #[error("schema `{kind}` declares no fields")]
    NoFields { kind: String },

    #[error("schema `{kind}` declares field `{field}` more than once")]
    DuplicateField { kind: String, field: String },

    #[error("schema `{kind}` has no field that is required in every mode")]
    NoAlwaysRequiredField { kind: String },

    #[error("picklist field `{field}` of schema `{kind}` declares no options")]
    MissingOptions { kind: String, field: String },

    #[error("column `{label}` of schema `{kind}` has an empty path")]
    EmptyColumnPath { kind: String, label: String },

    #[error("record kind `{kind}` is defined by more than one schema")]
    DuplicateKind { kind: String },
}

impl SchemaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
