//! Collection cache with fetch coalescing.
//!
//! The cache owns the record set shown in the list. Every state change is
//! published through a [`watch`] channel so hosts can re-render, and every
//! fetch runs as a shared future so concurrent callers join one request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tokio::sync::watch;
use tracing::{Instrument, debug, info_span, warn};

use listsync_model::{Record, RecordId, RecordKind};

use crate::error::TransportError;
use crate::service::RecordService;

/// Where the cache is in its fetch lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchStatus {
    /// Nothing fetched yet.
    Idle,
    Loading,
    Ready,
    /// The last fetch failed; records are from the last success.
    Error,
}

/// Snapshot of the cached collection.
///
/// `revision` identifies the record set: it only changes when a fetch
/// succeeds and replaces the records. Status changes and failed fetches leave
/// it untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub records: Arc<Vec<Record>>,
    pub revision: u64,
    pub status: FetchStatus,
    pub error: Option<TransportError>,
}

impl ResultSet {
    fn empty() -> Self {
        Self {
            records: Arc::new(Vec::new()),
            revision: 0,
            status: FetchStatus::Idle,
            error: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.status == FetchStatus::Loading
    }

    pub fn record(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().find(|record| &record.id == id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.record(id).is_some()
    }

    /// Same record set, ignoring status and error.
    pub fn same_identity(&self, other: &ResultSet) -> bool {
        self.revision == other.revision && Arc::ptr_eq(&self.records, &other.records)
    }
}

type FetchFuture = Shared<BoxFuture<'static, Result<ResultSet, TransportError>>>;

struct Ticketed {
    ticket: u64,
    future: FetchFuture,
}

#[derive(Default)]
struct Pending {
    next_ticket: u64,
    in_flight: Option<Ticketed>,
    queued: Option<Ticketed>,
}

struct Inner<S> {
    service: Arc<S>,
    kind: RecordKind,
    pending: Mutex<Pending>,
    state: watch::Sender<ResultSet>,
}

/// Cached record collection for one record kind.
///
/// Cloning yields another handle to the same cache.
pub struct CollectionCache<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for CollectionCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: RecordService> CollectionCache<S> {
    pub fn new(service: Arc<S>, kind: RecordKind) -> Self {
        let (state, _) = watch::channel(ResultSet::empty());
        Self {
            inner: Arc::new(Inner {
                service,
                kind,
                pending: Mutex::new(Pending::default()),
                state,
            }),
        }
    }

    pub fn kind(&self) -> &RecordKind {
        &self.inner.kind
    }

    /// Current state of the cache.
    pub fn snapshot(&self) -> ResultSet {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ResultSet> {
        self.inner.state.subscribe()
    }

    /// Fetch the collection, joining the in-flight request if there is one.
    ///
    /// On failure the previous records stay in place and the cache reports
    /// [`FetchStatus::Error`].
    pub async fn fetch(&self) -> Result<ResultSet, TransportError> {
        let future = {
            let mut pending = self.inner.lock_pending();
            match &pending.in_flight {
                Some(current) => {
                    debug!(kind = %self.inner.kind, ticket = current.ticket, "joining in-flight fetch");
                    current.future.clone()
                }
                None => Inner::start(&self.inner, &mut pending, None),
            }
        };
        future.await
    }

    /// Force a fresh fetch.
    ///
    /// A fetch already in flight may have been issued before the caller's
    /// write, so it is not reused: one follow-up fetch is queued behind it
    /// and every invalidation that arrives meanwhile shares that follow-up.
    pub async fn invalidate(&self) -> Result<ResultSet, TransportError> {
        let future = {
            let mut pending = self.inner.lock_pending();
            if let Some(queued) = &pending.queued {
                debug!(kind = %self.inner.kind, ticket = queued.ticket, "joining queued refetch");
                queued.future.clone()
            } else if let Some(current) = &pending.in_flight {
                let after = current.future.clone();
                Inner::start(&self.inner, &mut pending, Some(after))
            } else {
                Inner::start(&self.inner, &mut pending, None)
            }
        };
        future.await
    }
}

impl<S: RecordService> Inner<S> {
    fn lock_pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a fetch and register it as in flight, or as queued when
    /// `after` is set.
    fn start(this: &Arc<Self>, pending: &mut Pending, after: Option<FetchFuture>) -> FetchFuture {
        pending.next_ticket += 1;
        let ticket = pending.next_ticket;
        let queued = after.is_some();
        let span = info_span!("fetch", kind = %this.kind, ticket, queued);
        let inner = Arc::clone(this);
        let future = async move {
            if let Some(previous) = after {
                let _ = previous.await;
            }
            inner.mark_loading();
            let result = inner.service.fetch_collection(&inner.kind).await;
            inner.settle(ticket, result)
        }
        .instrument(span)
        .boxed()
        .shared();

        let entry = Ticketed {
            ticket,
            future: future.clone(),
        };
        if queued {
            pending.queued = Some(entry);
        } else {
            this.mark_loading();
            pending.in_flight = Some(entry);
        }
        future
    }

    fn mark_loading(&self) {
        self.state.send_if_modified(|set| {
            if set.status == FetchStatus::Loading {
                return false;
            }
            set.status = FetchStatus::Loading;
            true
        });
    }

    /// Apply a finished fetch and promote the queued follow-up, if any.
    fn settle(
        &self,
        ticket: u64,
        result: Result<Vec<Record>, TransportError>,
    ) -> Result<ResultSet, TransportError> {
        let mut pending = self.lock_pending();
        if pending
            .in_flight
            .as_ref()
            .is_some_and(|current| current.ticket == ticket)
        {
            pending.in_flight = pending.queued.take();
        }

        match result {
            Ok(records) => {
                let count = records.len();
                self.state.send_modify(|set| {
                    set.records = Arc::new(records);
                    set.revision += 1;
                    set.status = FetchStatus::Ready;
                    set.error = None;
                });
                let snapshot = self.state.borrow().clone();
                debug!(count, revision = snapshot.revision, "fetch finished");
                Ok(snapshot)
            }
            Err(err) => {
                warn!(error = %err, "fetch failed, keeping previous records");
                self.state.send_modify(|set| {
                    set.status = FetchStatus::Error;
                    set.error = Some(err.clone());
                });
                Err(err)
            }
        }
    }
}
