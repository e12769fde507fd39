#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use listsync_core::{
    FieldMap, NotificationLog, RecordService, SyncOptions, SyncOrchestrator, TransportError,
};
use listsync_model::{Record, RecordId, RecordKind, Severity};
use listsync_schemas::{RecordSchema, SchemaCatalog};
use tokio::sync::Semaphore;

pub fn id(value: &str) -> RecordId {
    RecordId::new(value).expect("valid id")
}

pub fn schema(kind: &str) -> RecordSchema {
    SchemaCatalog::builtin()
        .expect("builtin catalog")
        .get(&RecordKind::new(kind).expect("kind"))
        .cloned()
        .expect("schema present")
}

pub fn account(record_id: &str, name: &str) -> Record {
    Record::new(id(record_id))
        .with_field("Name", name)
        .with_field("Phone", "555-0100")
}

/// Calls can be held at a gate until the test releases them.
struct Gate {
    held: AtomicBool,
    permits: Semaphore,
}

impl Default for Gate {
    fn default() -> Self {
        Self {
            held: AtomicBool::new(false),
            permits: Semaphore::new(0),
        }
    }
}

impl Gate {
    async fn pass(&self) {
        if self.held.load(Ordering::SeqCst) {
            self.permits.acquire().await.expect("gate open").forget();
        }
    }
}

/// In-memory service with call counters, scripted failures and gates.
#[derive(Default)]
pub struct MockService {
    records: Mutex<Vec<Record>>,
    next_id: AtomicUsize,
    fetch_calls: AtomicUsize,
    load_calls: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    fail_fetch: Mutex<Option<String>>,
    fail_load: Mutex<Option<String>>,
    fail_save: Mutex<Option<String>>,
    payloads: Mutex<Vec<FieldMap>>,
    fetch_gate: Gate,
    load_gate: Gate,
    save_gate: Gate,
}

impl MockService {
    pub fn with_records(records: Vec<Record>) -> Arc<Self> {
        let service = Self::default();
        *service.records.lock().unwrap() = records;
        Arc::new(service)
    }

    pub fn set_records(&self, records: Vec<Record>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn remove(&self, record_id: &str) {
        self.records
            .lock()
            .unwrap()
            .retain(|record| record.id.as_str() != record_id);
    }

    pub fn fail_next_fetch(&self, message: &str) {
        *self.fail_fetch.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_next_load(&self, message: &str) {
        *self.fail_load.lock().unwrap() = Some(message.to_string());
    }

    pub fn fail_next_save(&self, message: &str) {
        *self.fail_save.lock().unwrap() = Some(message.to_string());
    }

    pub fn hold_fetches(&self) {
        self.fetch_gate.held.store(true, Ordering::SeqCst);
    }

    pub fn release_fetches(&self, count: usize) {
        self.fetch_gate.permits.add_permits(count);
    }

    pub fn hold_loads(&self) {
        self.load_gate.held.store(true, Ordering::SeqCst);
    }

    pub fn release_loads(&self, count: usize) {
        self.load_gate.permits.add_permits(count);
    }

    pub fn hold_saves(&self) {
        self.save_gate.held.store(true, Ordering::SeqCst);
    }

    pub fn release_saves(&self, count: usize) {
        self.save_gate.permits.add_permits(count);
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn last_payload(&self) -> Option<FieldMap> {
        self.payloads.lock().unwrap().last().cloned()
    }
}

impl RecordService for MockService {
    async fn fetch_collection(&self, _kind: &RecordKind) -> Result<Vec<Record>, TransportError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        // Read before waiting, like a request that left before later writes.
        let records = self.records.lock().unwrap().clone();
        let failure = self.fail_fetch.lock().unwrap().take();
        self.fetch_gate.pass().await;
        match failure {
            Some(message) => Err(TransportError::new(message)),
            None => Ok(records),
        }
    }

    async fn fetch_by_id(
        &self,
        _kind: &RecordKind,
        record_id: &RecordId,
    ) -> Result<Option<Record>, TransportError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        self.load_gate.pass().await;
        if let Some(message) = self.fail_load.lock().unwrap().take() {
            return Err(TransportError::new(message));
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|record| &record.id == record_id)
            .cloned())
    }

    async fn create(&self, _kind: &RecordKind, fields: &FieldMap) -> Result<RecordId, TransportError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(fields.clone());
        self.save_gate.pass().await;
        if let Some(message) = self.fail_save.lock().unwrap().take() {
            return Err(TransportError::new(message));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let new_id = id(&format!("new-{n}"));
        let mut record = Record::new(new_id.clone());
        record.fields = fields.clone();
        self.records.lock().unwrap().push(record);
        Ok(new_id)
    }

    async fn update(
        &self,
        _kind: &RecordKind,
        record_id: &RecordId,
        fields: &FieldMap,
    ) -> Result<(), TransportError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(fields.clone());
        self.save_gate.pass().await;
        if let Some(message) = self.fail_save.lock().unwrap().take() {
            return Err(TransportError::new(message));
        }
        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|record| &record.id == record_id) {
            Some(record) => {
                for (name, value) in fields {
                    record.fields.insert(name.clone(), value.clone());
                }
                Ok(())
            }
            None => Err(TransportError::new("entity is deleted")),
        }
    }
}

pub struct Harness {
    pub service: Arc<MockService>,
    pub notes: Arc<NotificationLog>,
    pub sync: SyncOrchestrator<MockService, NotificationLog>,
}

pub fn harness(kind: &str, records: Vec<Record>) -> Harness {
    let service = MockService::with_records(records);
    let notes = Arc::new(NotificationLog::new());
    let sync = SyncOrchestrator::new(
        Arc::clone(&service),
        Arc::clone(&notes),
        schema(kind),
        SyncOptions::default(),
    );
    Harness {
        service,
        notes,
        sync,
    }
}

/// `(severity, message)` pairs, oldest first; clears the log.
pub fn drain(notes: &NotificationLog) -> Vec<(Severity, String)> {
    notes
        .drain()
        .into_iter()
        .map(|note| (note.severity, note.message))
        .collect()
}
