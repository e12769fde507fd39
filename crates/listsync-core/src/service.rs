//! Contracts for the external collaborators the controller calls.
//!
//! The controller never knows how records are stored or fetched, nor how
//! notifications reach the user. Hosts implement these two traits.

use std::future::Future;
use std::sync::Mutex;

use serde_json::{Map, Value};

use listsync_model::{Notification, Record, RecordId, RecordKind};

use crate::error::TransportError;

/// Field payload sent on create and update.
pub type FieldMap = Map<String, Value>;

/// Record storage and query backend.
///
/// Timeouts and retries, if any, belong to implementations; the controller
/// imposes none and never retries on its own.
pub trait RecordService: Send + Sync + 'static {
    /// All records of `kind`, in display order.
    fn fetch_collection(
        &self,
        kind: &RecordKind,
    ) -> impl Future<Output = Result<Vec<Record>, TransportError>> + Send;

    /// One record, or `None` when it does not exist.
    fn fetch_by_id(
        &self,
        kind: &RecordKind,
        id: &RecordId,
    ) -> impl Future<Output = Result<Option<Record>, TransportError>> + Send;

    /// Insert a new record and return its identifier.
    fn create(
        &self,
        kind: &RecordKind,
        fields: &FieldMap,
    ) -> impl Future<Output = Result<RecordId, TransportError>> + Send;

    fn update(
        &self,
        kind: &RecordKind,
        id: &RecordId,
        fields: &FieldMap,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// User-visible feedback sink (toasts, status line, stderr...).
pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

/// Notifier that keeps every notification in memory.
///
/// Useful for hosts that render notifications in batches, and for tests.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything notified so far, oldest first.
    pub fn entries(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything notified so far.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(
            &mut *self
                .entries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner),
        )
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(notification);
    }
}
