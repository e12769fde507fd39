//! Loading schemas from TOML.
//!
//! A schema file looks like:
//!
//! ```toml
//! kind = "account"
//! label = "Account"
//!
//! [[field]]
//! name = "Name"
//! label = "Account Name"
//! kind = "text"
//! required = "always"
//!
//! [[column]]
//! label = "Name"
//! path = "Name"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use listsync_model::RecordKind;

use crate::error::SchemaError;
use crate::schema::{ColumnSpec, FieldKind, FieldSpec, RecordSchema, RequiredWhen};

/// Environment variable for overriding the schema directory.
pub const SCHEMAS_ENV_VAR: &str = "LISTSYNC_SCHEMAS_DIR";

const BUILTIN_SCHEMAS: &[(&str, &str)] = &[
    ("account.toml", include_str!("../schemas/account.toml")),
    ("contact.toml", include_str!("../schemas/contact.toml")),
    ("lead.toml", include_str!("../schemas/lead.toml")),
    ("opportunity.toml", include_str!("../schemas/opportunity.toml")),
];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaFile {
    kind: String,
    label: String,
    #[serde(default, rename = "field")]
    fields: Vec<FieldSpec>,
    #[serde(default, rename = "column")]
    columns: Vec<ColumnSpec>,
}

/// Parse and check one schema document. `origin` is only used in errors.
pub fn parse_schema(source: &str, origin: &Path) -> Result<RecordSchema, SchemaError> {
    let file: SchemaFile = toml::from_str(source).map_err(|source| SchemaError::Toml {
        path: origin.to_path_buf(),
        source,
    })?;
    let kind = RecordKind::new(file.kind).map_err(|source| SchemaError::InvalidKind {
        path: origin.to_path_buf(),
        source,
    })?;
    let schema = RecordSchema {
        kind,
        label: file.label,
        fields: file.fields,
        columns: file.columns,
    };
    check_schema(&schema)?;
    Ok(schema)
}

pub fn load_schema_file(path: &Path) -> Result<RecordSchema, SchemaError> {
    let source = std::fs::read_to_string(path).map_err(|source| SchemaError::io(path, source))?;
    parse_schema(&source, path)
}

/// Load every `*.toml` file of a directory, in file-name order.
pub fn load_schema_dir(dir: &Path) -> Result<Vec<RecordSchema>, SchemaError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SchemaError::io(dir, source))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|source| SchemaError::io(dir, source))?.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    paths.sort();
    paths.into_iter().map(|path| load_schema_file(&path)).collect()
}

/// The schemas compiled into the crate.
pub fn builtin_schemas() -> Result<Vec<RecordSchema>, SchemaError> {
    BUILTIN_SCHEMAS
        .iter()
        .map(|(name, source)| parse_schema(source, &PathBuf::from("builtin").join(name)))
        .collect()
}

/// Schema directory from the environment, if configured.
pub fn schemas_dir_from_env() -> Option<PathBuf> {
    std::env::var_os(SCHEMAS_ENV_VAR).map(PathBuf::from)
}

fn check_schema(schema: &RecordSchema) -> Result<(), SchemaError> {
    let kind = schema.kind.to_string();
    if schema.fields.is_empty() {
        return Err(SchemaError::NoFields { kind });
    }
    let mut seen = BTreeSet::new();
    for field in &schema.fields {
        if !seen.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateField {
                kind,
                field: field.name.clone(),
            });
        }
        if field.kind == FieldKind::Picklist && field.options.is_empty() {
            return Err(SchemaError::MissingOptions {
                kind,
                field: field.name.clone(),
            });
        }
    }
    if !schema
        .fields
        .iter()
        .any(|field| field.required == RequiredWhen::Always)
    {
        return Err(SchemaError::NoAlwaysRequiredField { kind });
    }
    if let Some(column) = schema.columns.iter().find(|c| c.path.trim().is_empty()) {
        return Err(SchemaError::EmptyColumnPath {
            kind,
            label: column.label.clone(),
        });
    }
    Ok(())
}

/// All known schemas, keyed by record kind.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    schemas: BTreeMap<RecordKind, RecordSchema>,
}

impl SchemaCatalog {
    pub fn from_schemas(schemas: Vec<RecordSchema>) -> Result<Self, SchemaError> {
        let mut catalog = Self::default();
        for schema in schemas {
            if catalog.schemas.contains_key(&schema.kind) {
                return Err(SchemaError::DuplicateKind {
                    kind: schema.kind.to_string(),
                });
            }
            catalog.schemas.insert(schema.kind.clone(), schema);
        }
        Ok(catalog)
    }

    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_schemas(builtin_schemas()?)
    }

    /// Resolution order: explicit directory, then `LISTSYNC_SCHEMAS_DIR`,
    /// then the built-in catalog.
    pub fn resolve(dir: Option<&Path>) -> Result<Self, SchemaError> {
        match dir.map(Path::to_path_buf).or_else(schemas_dir_from_env) {
            Some(dir) => Self::from_schemas(load_schema_dir(&dir)?),
            None => Self::builtin(),
        }
    }

    pub fn get(&self, kind: &RecordKind) -> Option<&RecordSchema> {
        self.schemas.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &RecordKind> {
        self.schemas.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordSchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
