//! Wiring of cache, selection and editor behind the user-facing flows.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use listsync_model::{EditorMode, Notification, RecordId};
use listsync_schemas::RecordSchema;

use crate::cache::{CollectionCache, ResultSet};
use crate::editor::{EditorOutcome, OpenState, RecordEditor, SaveOutcome};
use crate::error::{EditorError, LoadError, PreconditionError, TransportError};
use crate::options::SyncOptions;
use crate::selection::SelectionTracker;
use crate::service::{Notifier, RecordService};

/// Result of a flow that opens the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum OpenOutcome {
    Opened,
    /// The editor was closed or reopened before the record loaded. Nothing
    /// is notified.
    Superseded,
    /// The selection did not hold exactly one record; the editor stayed shut.
    Precondition(PreconditionError),
    /// The record could not be loaded; the editor is closed again.
    LoadFailed(LoadError),
    /// The editor refused to open.
    Rejected(EditorError),
}

/// Result of a fetch triggered by a flow.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Refreshed(ResultSet),
    Failed(TransportError),
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, Self::Refreshed(_))
    }
}

impl From<Result<ResultSet, TransportError>> for RefreshOutcome {
    fn from(result: Result<ResultSet, TransportError>) -> Self {
        match result {
            Ok(set) => Self::Refreshed(set),
            Err(err) => Self::Failed(err),
        }
    }
}

/// Result of [`SyncOrchestrator::save`].
#[derive(Debug, Clone, PartialEq)]
pub enum SaveFlow {
    /// Persisted, then refetched.
    Saved {
        id: RecordId,
        refresh: RefreshOutcome,
    },
    /// Invalid draft, rejected save or a save already in flight.
    NotSaved(SaveOutcome),
    Rejected(EditorError),
}

/// List-edit controller for one record kind.
///
/// Every flow catches its own failures and reports them through the
/// [`Notifier`]; the returned outcome only tells the host what happened.
pub struct SyncOrchestrator<S, N> {
    schema: Arc<RecordSchema>,
    options: Arc<SyncOptions>,
    notifier: Arc<N>,
    cache: CollectionCache<S>,
    selection: SelectionTracker,
    editor: RecordEditor<S, N>,
}

impl<S: RecordService, N: Notifier> SyncOrchestrator<S, N> {
    pub fn new(
        service: Arc<S>,
        notifier: Arc<N>,
        schema: RecordSchema,
        options: SyncOptions,
    ) -> Self {
        let schema = Arc::new(schema);
        let options = Arc::new(options);
        let cache = CollectionCache::new(Arc::clone(&service), schema.kind.clone());
        let selection = SelectionTracker::new(cache.subscribe());
        let editor = RecordEditor::new(
            service,
            Arc::clone(&notifier),
            Arc::clone(&schema),
            Arc::clone(&options),
        );
        Self {
            schema,
            options,
            notifier,
            cache,
            selection,
            editor,
        }
    }

    pub fn schema(&self) -> &RecordSchema {
        &self.schema
    }

    /// Initial load of the list.
    pub async fn activate(&self) -> RefreshOutcome {
        debug!(kind = %self.schema.kind, "activating");
        let outcome = RefreshOutcome::from(self.cache.fetch().await);
        if let RefreshOutcome::Failed(err) = &outcome {
            self.notify(Notification::error(
                self.options.error_title.clone(),
                err.message.clone(),
            ));
        }
        outcome
    }

    /// Open the editor on a blank record.
    pub async fn create_flow(&self) -> OpenOutcome {
        self.open(EditorMode::Create, None).await
    }

    /// Open the editor on the one selected record.
    ///
    /// Any other selection size warns the user and leaves the editor shut.
    pub async fn edit_flow(&self) -> OpenOutcome {
        let record = match self.selection.require_single() {
            Ok(record) => record,
            Err(violation) => {
                debug!(kind = %self.schema.kind, precondition = violation.tag(), "edit blocked");
                let template = match violation {
                    PreconditionError::NoneSelected => &self.options.none_selected,
                    PreconditionError::MultipleSelected { .. } => {
                        &self.options.multiple_selected
                    }
                };
                self.notify(Notification::warning(
                    self.options.warning_title.clone(),
                    SyncOptions::render(template, &self.schema.label),
                ));
                return OpenOutcome::Precondition(violation);
            }
        };
        self.open(EditorMode::Edit, Some(record.id)).await
    }

    /// Open a read-only editor for a row, regardless of the selection.
    pub async fn view_flow(&self, id: RecordId) -> OpenOutcome {
        self.open(EditorMode::View, Some(id)).await
    }

    /// User-requested refetch.
    pub async fn refresh_flow(&self) -> RefreshOutcome {
        self.refresh().await
    }

    /// Save the open editor and, on success, refetch the list.
    ///
    /// The refetch also runs when the host closed the editor while the save
    /// was waiting on the service.
    pub async fn save(&self) -> SaveFlow {
        match self.editor.save().await {
            Ok(SaveOutcome::Saved { id, .. }) => {
                let refresh = self
                    .on_editor_closed(EditorOutcome::Refresh)
                    .await
                    .unwrap_or_else(|| RefreshOutcome::Refreshed(self.cache.snapshot()));
                SaveFlow::Saved { id, refresh }
            }
            Ok(other) => SaveFlow::NotSaved(other),
            Err(err) => {
                warn!(kind = %self.schema.kind, error = %err, "save rejected");
                self.notify(Notification::error(
                    self.options.error_title.clone(),
                    err.to_string(),
                ));
                SaveFlow::Rejected(err)
            }
        }
    }

    /// Close the editor without saving.
    pub async fn cancel(&self) -> EditorOutcome {
        let outcome = self.editor.close();
        self.on_editor_closed(outcome).await;
        outcome
    }

    /// React to the editor closing.
    ///
    /// Only [`EditorOutcome::Refresh`] touches the list: the selection is
    /// cleared and the cache refetched. Returns the refetch result, if any.
    pub async fn on_editor_closed(&self, outcome: EditorOutcome) -> Option<RefreshOutcome> {
        match outcome {
            EditorOutcome::Refresh => {
                self.selection.clear();
                Some(self.refresh().await)
            }
            EditorOutcome::Cancel | EditorOutcome::Error => {
                debug!(kind = %self.schema.kind, ?outcome, "editor closed without changes");
                None
            }
        }
    }

    /// Replace the selection. Returns the ids that are present in the list.
    pub fn set_selection<I>(&self, ids: I) -> Vec<RecordId>
    where
        I: IntoIterator<Item = RecordId>,
    {
        self.selection.set_selection(ids)
    }

    pub fn selected_ids(&self) -> Vec<RecordId> {
        self.selection.selected_ids()
    }

    /// Exactly one record is selected.
    pub fn can_edit(&self) -> bool {
        self.selection.len() == 1
    }

    pub fn snapshot(&self) -> ResultSet {
        self.cache.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResultSet> {
        self.cache.subscribe()
    }

    pub fn editor(&self) -> &RecordEditor<S, N> {
        &self.editor
    }

    /// The cache, for hosts that refetch on external change signals.
    pub fn cache(&self) -> &CollectionCache<S> {
        &self.cache
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    async fn open(&self, mode: EditorMode, id: Option<RecordId>) -> OpenOutcome {
        match self.editor.open(mode, id).await {
            Ok(OpenState::Ready) => OpenOutcome::Opened,
            Ok(OpenState::Superseded) => {
                debug!(kind = %self.schema.kind, %mode, "open superseded before load finished");
                OpenOutcome::Superseded
            }
            Err(EditorError::Load(err)) => {
                self.on_editor_closed(EditorOutcome::Error).await;
                OpenOutcome::LoadFailed(err)
            }
            Err(err) => {
                warn!(kind = %self.schema.kind, %mode, error = %err, "editor did not open");
                self.notify(Notification::error(
                    self.options.error_title.clone(),
                    err.to_string(),
                ));
                OpenOutcome::Rejected(err)
            }
        }
    }

    async fn refresh(&self) -> RefreshOutcome {
        let outcome = RefreshOutcome::from(self.cache.invalidate().await);
        match &outcome {
            RefreshOutcome::Refreshed(set) => {
                info!(kind = %self.schema.kind, revision = set.revision, count = set.len(), "list refreshed");
                self.notify(Notification::success(
                    self.options.success_title.clone(),
                    self.options.refreshed.clone(),
                ));
            }
            RefreshOutcome::Failed(err) => {
                warn!(kind = %self.schema.kind, error = %err, "refresh failed");
                self.notify(Notification::error(
                    self.options.error_title.clone(),
                    self.options.refresh_failed.clone(),
                ));
            }
        }
        outcome
    }

    fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }
}
