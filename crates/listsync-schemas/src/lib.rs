#![deny(unsafe_code)]

pub mod error;
pub mod loaders;
pub mod normalize;
pub mod schema;
pub mod validate;

pub use crate::error::SchemaError;
pub use crate::loaders::{
    SCHEMAS_ENV_VAR, SchemaCatalog, builtin_schemas, load_schema_dir, load_schema_file,
    parse_schema,
};
pub use crate::normalize::{normalize_value, payload, payload_value};
pub use crate::schema::{ColumnSpec, FieldKind, FieldSpec, RecordSchema, RequiredWhen};
pub use crate::validate::{DATE_FORMAT, validate_draft};
