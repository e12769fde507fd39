//! Record service backed by one JSON file.
//!
//! The file holds an object mapping each record kind to an array of record
//! objects, each carrying an `Id`:
//!
//! ```json
//! { "account": [ { "Id": "…", "Name": "Acme" } ] }
//! ```
//!
//! A missing file reads as an empty store. Every write rewrites the whole
//! file through a temporary sibling and a rename. The [`RecordService`]
//! methods run the file I/O on tokio's blocking pool.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, trace};
use uuid::Uuid;

use listsync_core::{FieldMap, RecordService, TransportError};
use listsync_model::{ID_FIELD, ModelError, Record, RecordId, RecordKind, display_value};

use crate::logging::redact_value;

type Collections = BTreeMap<String, Vec<Record>>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read store {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write store {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not a valid store: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode store: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("{kind} record {id} does not exist")]
    UnknownRecord { kind: RecordKind, id: RecordId },
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl From<StoreError> for TransportError {
    fn from(err: StoreError) -> Self {
        TransportError::new(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Cloning yields another handle to the same file and write lock.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records of one kind, in file order.
    pub fn records(&self, kind: &RecordKind) -> Result<Vec<Record>> {
        let mut collections = self.read()?;
        Ok(collections.remove(kind.as_str()).unwrap_or_default())
    }

    pub fn find(&self, kind: &RecordKind, id: &RecordId) -> Result<Option<Record>> {
        Ok(self
            .records(kind)?
            .into_iter()
            .find(|record| &record.id == id))
    }

    /// Append a record with a fresh UUID and return the id.
    pub fn insert(&self, kind: &RecordKind, fields: &FieldMap) -> Result<RecordId> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut collections = self.read()?;
        let id = RecordId::new(Uuid::new_v4().to_string())?;
        let mut record = Record::new(id.clone());
        merge_fields(&mut record, fields);
        collections
            .entry(kind.as_str().to_string())
            .or_default()
            .push(record);
        self.write(&collections)?;
        debug!(%kind, record_id = %id, fields = fields.len(), "record inserted");
        Ok(id)
    }

    /// Overwrite the given fields of an existing record.
    pub fn modify(&self, kind: &RecordKind, id: &RecordId, fields: &FieldMap) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut collections = self.read()?;
        let record = collections
            .get_mut(kind.as_str())
            .and_then(|records| records.iter_mut().find(|record| &record.id == id))
            .ok_or_else(|| StoreError::UnknownRecord {
                kind: kind.clone(),
                id: id.clone(),
            })?;
        merge_fields(record, fields);
        self.write(&collections)?;
        debug!(%kind, record_id = %id, fields = fields.len(), "record updated");
        Ok(())
    }

    fn read(&self) -> Result<Collections> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                trace!(path = %self.path.display(), "store file missing, starting empty");
                return Ok(Collections::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(Collections::new());
        }
        serde_json::from_str(&text).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, collections: &Collections) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(collections).map_err(StoreError::Encode)?;
        bytes.push(b'\n');
        let tmp = temp_path(&self.path);
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        fs::write(&tmp, &bytes).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn merge_fields(record: &mut Record, fields: &FieldMap) {
    for (name, value) in fields {
        if name == ID_FIELD {
            continue;
        }
        let text = display_value(value);
        trace!(field = %name, value = redact_value(&text), "store field");
        record.fields.insert(name.clone(), value.clone());
    }
}

/// Run a blocking store operation off the async executor.
async fn blocking<T, F>(job: F) -> std::result::Result<T, TransportError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(job).await {
        Ok(result) => Ok(result?),
        Err(err) => Err(TransportError::new(format!("store task failed: {err}"))),
    }
}

impl RecordService for JsonFileStore {
    async fn fetch_collection(
        &self,
        kind: &RecordKind,
    ) -> std::result::Result<Vec<Record>, TransportError> {
        let (store, kind) = (self.clone(), kind.clone());
        blocking(move || store.records(&kind)).await
    }

    async fn fetch_by_id(
        &self,
        kind: &RecordKind,
        id: &RecordId,
    ) -> std::result::Result<Option<Record>, TransportError> {
        let (store, kind, id) = (self.clone(), kind.clone(), id.clone());
        blocking(move || store.find(&kind, &id)).await
    }

    async fn create(
        &self,
        kind: &RecordKind,
        fields: &FieldMap,
    ) -> std::result::Result<RecordId, TransportError> {
        let (store, kind, fields) = (self.clone(), kind.clone(), fields.clone());
        blocking(move || store.insert(&kind, &fields)).await
    }

    async fn update(
        &self,
        kind: &RecordKind,
        id: &RecordId,
        fields: &FieldMap,
    ) -> std::result::Result<(), TransportError> {
        let (store, kind, id, fields) = (self.clone(), kind.clone(), id.clone(), fields.clone());
        blocking(move || store.modify(&kind, &id, &fields)).await
    }
}
