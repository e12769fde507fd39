//! Selection of rows in the current record set.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, trace};

use listsync_model::{Record, RecordId};

use crate::cache::ResultSet;
use crate::error::PreconditionError;

#[derive(Debug, Default)]
struct Selection {
    /// Revision of the record set the ids were picked from.
    revision: u64,
    ids: Vec<RecordId>,
}

/// Tracks which records the user has selected.
///
/// A selection belongs to one record set. As soon as the cache publishes a
/// new set (a successful fetch) the selection reads as empty; a failed fetch
/// keeps the set, and therefore the selection.
#[derive(Debug)]
pub struct SelectionTracker {
    results: watch::Receiver<ResultSet>,
    state: Mutex<Selection>,
}

impl SelectionTracker {
    pub fn new(results: watch::Receiver<ResultSet>) -> Self {
        let revision = results.borrow().revision;
        Self {
            results,
            state: Mutex::new(Selection {
                revision,
                ids: Vec::new(),
            }),
        }
    }

    /// Replace the selection, keeping only ids present in the current set.
    ///
    /// Order of first appearance is kept and duplicates collapse. Returns the
    /// ids actually selected.
    pub fn set_selection<I>(&self, ids: I) -> Vec<RecordId>
    where
        I: IntoIterator<Item = RecordId>,
    {
        let (revision, kept) = {
            let current = self.results.borrow();
            let mut kept: Vec<RecordId> = Vec::new();
            let mut dropped = 0usize;
            for id in ids {
                if kept.contains(&id) {
                    continue;
                }
                if current.contains(&id) {
                    kept.push(id);
                } else {
                    dropped += 1;
                }
            }
            if dropped > 0 {
                debug!(dropped, "ignoring selected ids missing from the record set");
            }
            (current.revision, kept)
        };

        let mut state = self.lock();
        state.revision = revision;
        state.ids.clone_from(&kept);
        trace!(revision, count = kept.len(), "selection replaced");
        kept
    }

    /// Currently selected ids, in selection order.
    pub fn selected_ids(&self) -> Vec<RecordId> {
        let revision = self.results.borrow().revision;
        let mut state = self.lock();
        Self::expire(&mut state, revision);
        state.ids.clone()
    }

    pub fn len(&self) -> usize {
        self.selected_ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().ids.clear();
    }

    /// The one selected record.
    ///
    /// # Errors
    ///
    /// [`PreconditionError::NoneSelected`] for an empty selection and
    /// [`PreconditionError::MultipleSelected`] for more than one id.
    pub fn require_single(&self) -> Result<Record, PreconditionError> {
        let current = self.results.borrow();
        let mut state = self.lock();
        Self::expire(&mut state, current.revision);
        match state.ids.as_slice() {
            [id] => current
                .record(id)
                .cloned()
                .ok_or(PreconditionError::NoneSelected),
            [] => Err(PreconditionError::NoneSelected),
            ids => Err(PreconditionError::MultipleSelected { count: ids.len() }),
        }
    }

    fn expire(state: &mut Selection, revision: u64) {
        if state.revision != revision {
            if !state.ids.is_empty() {
                debug!(
                    from = state.revision,
                    to = revision,
                    cleared = state.ids.len(),
                    "record set replaced, clearing selection"
                );
            }
            state.ids.clear();
            state.revision = revision;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Selection> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
