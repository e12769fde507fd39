//! Single-record create / edit / view workflow.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{Instrument, debug, info, info_span, warn};

use listsync_model::{
    DraftRecord, EditorMode, FieldValue, Notification, RecordId, ValidationResult,
};
use listsync_schemas::{RecordSchema, payload, validate_draft};

use crate::error::{EditorError, LoadError, NotFoundError, TransportError, ValidationError};
use crate::options::SyncOptions;
use crate::service::{Notifier, RecordService};

/// How an editor session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorOutcome {
    /// A save succeeded; the list must be refetched.
    Refresh,
    /// Closed without saving.
    Cancel,
    /// The record could not be loaded.
    Error,
}

/// How a successful [`RecordEditor::open`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenState {
    /// The session is open and its draft is ready.
    Ready,
    /// The session was closed or replaced while its record was loading.
    Superseded,
}

/// Result of one [`RecordEditor::save`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Persisted. The editor is closed.
    Saved { id: RecordId, mode: EditorMode },
    /// Local validation failed; nothing was sent.
    Invalid(ValidationError),
    /// The service rejected the save; the editor stays open.
    Failed(TransportError),
    /// Another save of the same draft is still running; nothing was sent.
    InFlight,
}

impl SaveOutcome {
    /// The editor outcome to hand to the orchestrator, if the session ended.
    pub fn editor_outcome(&self) -> Option<EditorOutcome> {
        match self {
            Self::Saved { .. } => Some(EditorOutcome::Refresh),
            Self::Invalid(_) | Self::Failed(_) | Self::InFlight => None,
        }
    }
}

#[derive(Debug)]
struct Session {
    id: u64,
    mode: EditorMode,
    record_id: Option<RecordId>,
    draft: DraftRecord,
    original: DraftRecord,
    loading: bool,
    saving: bool,
}

#[derive(Debug, Default)]
struct EditorState {
    next_session: u64,
    session: Option<Session>,
}

impl EditorState {
    fn current(&mut self, id: u64) -> Option<&mut Session> {
        self.session.as_mut().filter(|session| session.id == id)
    }
}

struct Shared<S, N> {
    service: Arc<S>,
    notifier: Arc<N>,
    schema: Arc<RecordSchema>,
    options: Arc<SyncOptions>,
    state: Mutex<EditorState>,
}

/// Resets the saving flag if a save future is dropped before it settles.
struct SavingGuard<'a> {
    state: &'a Mutex<EditorState>,
    session: u64,
    armed: bool,
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(session) = state.current(self.session) {
                session.saving = false;
            }
        }
    }
}

/// Editor for one record of one kind.
///
/// All methods take `&self`, so the host can close the editor while a save is
/// still awaiting the service. Cloning yields another handle to the same
/// editor.
pub struct RecordEditor<S, N> {
    shared: Arc<Shared<S, N>>,
}

impl<S, N> Clone for RecordEditor<S, N> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: RecordService, N: Notifier> RecordEditor<S, N> {
    pub fn new(
        service: Arc<S>,
        notifier: Arc<N>,
        schema: Arc<RecordSchema>,
        options: Arc<SyncOptions>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                service,
                notifier,
                schema,
                options,
                state: Mutex::new(EditorState::default()),
            }),
        }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.shared.schema
    }

    /// Open a session.
    ///
    /// Create starts from the schema's blank draft and ignores `id`. Edit and
    /// View load the record and normalize every schema field. A previous
    /// session is discarded unless it is saving.
    ///
    /// # Errors
    ///
    /// [`EditorError::MissingRecordId`] for Edit/View without an id,
    /// [`EditorError::AlreadyOpen`] while the current session is saving, and
    /// [`EditorError::Load`] when the record is missing or the service fails.
    /// A load failure closes the editor and notifies the user. When the
    /// session is closed or replaced before its record arrives, the load
    /// result is dropped and [`OpenState::Superseded`] is returned.
    pub async fn open(
        &self,
        mode: EditorMode,
        id: Option<RecordId>,
    ) -> Result<OpenState, EditorError> {
        let schema = &self.shared.schema;
        let record_id = match (mode.needs_record_id(), id) {
            (true, None) => return Err(EditorError::MissingRecordId { mode }),
            (true, Some(id)) => Some(id),
            (false, _) => None,
        };

        let session_id = {
            let mut state = self.lock();
            if state.session.as_ref().is_some_and(|session| session.saving) {
                return Err(EditorError::AlreadyOpen);
            }
            state.next_session += 1;
            let session_id = state.next_session;
            let draft = schema.blank_draft();
            if let Some(previous) = state.session.take() {
                debug!(session = previous.id, "discarding previous editor session");
            }
            state.session = Some(Session {
                id: session_id,
                mode,
                record_id: record_id.clone(),
                original: draft.clone(),
                draft,
                loading: record_id.is_some(),
                saving: false,
            });
            session_id
        };

        let Some(id) = record_id else {
            debug!(kind = %schema.kind, session = session_id, "editor opened for a new record");
            return Ok(OpenState::Ready);
        };

        let span = info_span!("load", kind = %schema.kind, record_id = %id, %mode);
        let loaded = self
            .shared
            .service
            .fetch_by_id(&schema.kind, &id)
            .instrument(span)
            .await;

        let outcome = match loaded {
            Ok(Some(record)) => Ok(schema.draft_from_record(&record)),
            Ok(None) => Err(LoadError::from(NotFoundError {
                kind: schema.kind.clone(),
                id: id.clone(),
            })),
            Err(err) => Err(LoadError::from(err)),
        };

        let mut state = self.lock();
        if state.current(session_id).is_none() {
            debug!(session = session_id, "editor closed before its record loaded");
            return Ok(OpenState::Superseded);
        }
        match outcome {
            Ok(draft) => {
                if let Some(session) = state.current(session_id) {
                    session.original = draft.clone();
                    session.draft = draft;
                    session.loading = false;
                }
                debug!(kind = %schema.kind, record_id = %id, "editor loaded record");
                Ok(OpenState::Ready)
            }
            Err(err) => {
                state.session = None;
                drop(state);
                warn!(kind = %schema.kind, record_id = %id, error = %err, "could not load record");
                self.notify(Notification::error(
                    self.shared.options.error_title.clone(),
                    err.to_string(),
                ));
                Err(EditorError::Load(err))
            }
        }
    }

    /// Overwrite one draft field. No validation happens here.
    ///
    /// # Errors
    ///
    /// When no session is open, the record is still loading, the session is
    /// read-only, or the field is not part of the schema.
    pub fn set_field(&self, name: &str, value: FieldValue) -> Result<(), EditorError> {
        let mut state = self.lock();
        let session = state.session.as_mut().ok_or(EditorError::NotOpen)?;
        if session.loading {
            return Err(EditorError::Loading);
        }
        if session.mode.is_read_only() {
            return Err(EditorError::ReadOnly);
        }
        session
            .draft
            .set(name, value)
            .map(|_| ())
            .ok_or_else(|| EditorError::UnknownField {
                field: name.to_string(),
            })
    }

    /// Check the draft against the schema for the session's mode.
    ///
    /// A failed check notifies the first failure's message. The draft is left
    /// as it is.
    ///
    /// # Errors
    ///
    /// [`EditorError::NotOpen`] when no session is open.
    pub fn validate(&self) -> Result<ValidationResult, EditorError> {
        let result = {
            let state = self.lock();
            let session = state.session.as_ref().ok_or(EditorError::NotOpen)?;
            validate_draft(&self.shared.schema, &session.draft, session.mode)
        };
        if result.ok {
            return Ok(result);
        }
        let err = ValidationError(result);
        self.notify_invalid(err.to_string());
        Ok(err.0)
    }

    /// Validate and persist the draft.
    ///
    /// A failed validation notifies its first message and sends nothing. A
    /// second call while the first is still waiting on the service returns
    /// [`SaveOutcome::InFlight`] without calling it. On success the editor
    /// closes, even when the host already closed it while the call was
    /// running. On failure the upstream message is notified as is and the
    /// draft stays open.
    ///
    /// # Errors
    ///
    /// When no session is open, the record is still loading, or the session
    /// is read-only.
    pub async fn save(&self) -> Result<SaveOutcome, EditorError> {
        let schema = &self.shared.schema;
        let options = &self.shared.options;

        let (session_id, mode, record_id, fields) = {
            let mut state = self.lock();
            let session = state.session.as_mut().ok_or(EditorError::NotOpen)?;
            if session.loading {
                return Err(EditorError::Loading);
            }
            if session.mode.is_read_only() {
                return Err(EditorError::ReadOnly);
            }
            if session.saving {
                debug!(session = session.id, "save already in flight");
                return Ok(SaveOutcome::InFlight);
            }
            let result = validate_draft(schema, &session.draft, session.mode);
            if !result.ok {
                drop(state);
                debug!(
                    kind = %schema.kind,
                    failures = result.failures.len(),
                    "draft failed validation"
                );
                let err = ValidationError(result);
                self.notify_invalid(err.to_string());
                return Ok(SaveOutcome::Invalid(err));
            }
            if session.mode == EditorMode::Edit && session.record_id.is_none() {
                return Err(EditorError::MissingRecordId { mode: session.mode });
            }
            session.saving = true;
            (
                session.id,
                session.mode,
                session.record_id.clone(),
                payload(schema, &session.draft),
            )
        };

        let mut guard = SavingGuard {
            state: &self.shared.state,
            session: session_id,
            armed: true,
        };

        let span = info_span!(
            "save",
            kind = %schema.kind,
            %mode,
            record_id = record_id.as_ref().map(RecordId::as_str),
            fields = fields.len(),
        );
        let service = &self.shared.service;
        let result = async {
            match record_id {
                Some(id) => service.update(&schema.kind, &id, &fields).await.map(|()| id),
                None => service.create(&schema.kind, &fields).await,
            }
        }
        .instrument(span)
        .await;

        guard.armed = false;
        let mut state = self.lock();
        match result {
            Ok(id) => {
                if state.current(session_id).is_some() {
                    state.session = None;
                } else {
                    debug!(session = session_id, "save finished after the editor closed");
                }
                drop(state);
                info!(kind = %schema.kind, record_id = %id, %mode, "record saved");
                let template = if mode == EditorMode::Create {
                    &options.created
                } else {
                    &options.updated
                };
                self.notify(Notification::success(
                    options.success_title.clone(),
                    SyncOptions::render(template, &schema.label),
                ));
                Ok(SaveOutcome::Saved { id, mode })
            }
            Err(err) => {
                if let Some(session) = state.current(session_id) {
                    session.saving = false;
                }
                drop(state);
                warn!(kind = %schema.kind, %mode, error = %err, "save failed");
                self.notify(Notification::error(
                    options.error_title.clone(),
                    err.message.clone(),
                ));
                Ok(SaveOutcome::Failed(err))
            }
        }
    }

    /// Close the editor and drop the draft. An in-flight save keeps running.
    pub fn close(&self) -> EditorOutcome {
        let mut state = self.lock();
        if let Some(session) = state.session.take() {
            if session.saving {
                debug!(session = session.id, "editor closed with a save in flight");
            } else {
                debug!(session = session.id, "editor closed");
            }
        }
        EditorOutcome::Cancel
    }

    pub fn is_open(&self) -> bool {
        self.lock().session.is_some()
    }

    pub fn mode(&self) -> Option<EditorMode> {
        self.lock().session.as_ref().map(|session| session.mode)
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.lock()
            .session
            .as_ref()
            .and_then(|session| session.record_id.clone())
    }

    /// Copy of the current draft; `None` while closed or loading.
    pub fn draft(&self) -> Option<DraftRecord> {
        self.lock()
            .session
            .as_ref()
            .filter(|session| !session.loading)
            .map(|session| session.draft.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.lock()
            .session
            .as_ref()
            .is_some_and(|session| session.loading)
    }

    pub fn is_saving(&self) -> bool {
        self.lock()
            .session
            .as_ref()
            .is_some_and(|session| session.saving)
    }

    /// True when the draft differs from what was loaded or initialized.
    pub fn is_dirty(&self) -> bool {
        self.lock()
            .session
            .as_ref()
            .is_some_and(|session| session.draft != session.original)
    }

    /// Modal heading for the open session.
    pub fn title(&self) -> Option<String> {
        let label = &self.shared.schema.label;
        self.mode().map(|mode| match mode {
            EditorMode::Create => format!("Create New {label}"),
            EditorMode::Edit => format!("Edit {label}"),
            EditorMode::View => format!("View {label}"),
        })
    }

    fn notify(&self, notification: Notification) {
        self.shared.notifier.notify(notification);
    }

    fn notify_invalid(&self, message: String) {
        self.notify(Notification::error(
            self.shared.options.error_title.clone(),
            message,
        ));
    }

    fn lock(&self) -> MutexGuard<'_, EditorState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
