//! List-edit synchronization controller.
//!
//! A [`SyncOrchestrator`] keeps a cached list of one record kind, the user's
//! selection in that list, and a single-record editor consistent with each
//! other:
//!
//! - [`CollectionCache`] fetches the list and coalesces concurrent fetches.
//! - [`SelectionTracker`] holds the selected ids and forgets them whenever the
//!   list is replaced.
//! - [`RecordEditor`] loads, validates and saves one draft at a time.
//!
//! Storage and user feedback are abstracted behind [`RecordService`] and
//! [`Notifier`].

#![deny(unsafe_code)]

pub mod cache;
pub mod editor;
pub mod error;
pub mod options;
pub mod orchestrator;
pub mod selection;
pub mod service;

pub use crate::cache::{CollectionCache, FetchStatus, ResultSet};
pub use crate::editor::{EditorOutcome, OpenState, RecordEditor, SaveOutcome};
pub use crate::error::{
    EditorError, LoadError, NotFoundError, PreconditionError, TransportError, ValidationError,
};
pub use crate::options::SyncOptions;
pub use crate::orchestrator::{OpenOutcome, RefreshOutcome, SaveFlow, SyncOrchestrator};
pub use crate::selection::SelectionTracker;
pub use crate::service::{FieldMap, NotificationLog, Notifier, RecordService};
