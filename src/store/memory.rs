//! In-memory versioned store, built as an actor.
//!
//! # Concurrency Model
//! The [`StoreActor`] owns the version-stamped records and processes requests
//! *sequentially* from its channel, so no lock is needed for the map. That
//! sequential loop is also what makes `compare_and_put` a true
//! compare-and-commit primitive: two racing commits staged against the same
//! observed version are serialized through the loop, and the second one finds
//! the version already bumped.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::model::MachineRecord;
use crate::store::{RecordChange, StoreError, TransactionStore, Version, View};

/// One-shot response channel for store requests.
type Response<T> = oneshot::Sender<Result<T, StoreError>>;

/// Requests understood by the store actor.
#[derive(Debug)]
enum StoreRequest {
    Read {
        view: View,
        respond_to: Response<Option<(MachineRecord, Version)>>,
    },
    CompareAndPut {
        view: View,
        expected: Option<Version>,
        record: MachineRecord,
        respond_to: Response<Version>,
    },
    Put {
        view: View,
        record: MachineRecord,
        respond_to: Response<Version>,
    },
}

/// The actor owning the versioned records.
pub struct StoreActor {
    receiver: mpsc::Receiver<StoreRequest>,
    records: HashMap<View, (MachineRecord, Version)>,
    next_version: Version,
    changes: broadcast::Sender<RecordChange>,
}

impl StoreActor {
    /// Runs the store loop until every [`MemoryStore`] handle is dropped.
    pub async fn run(mut self) {
        info!("store actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                StoreRequest::Read { view, respond_to } => {
                    let found = self.records.get(&view).cloned();
                    debug!(?view, found = found.is_some(), "read");
                    let _ = respond_to.send(Ok(found));
                }
                StoreRequest::CompareAndPut {
                    view,
                    expected,
                    record,
                    respond_to,
                } => {
                    let current = self.records.get(&view).map(|(_, version)| *version);
                    if current != expected {
                        debug!(?view, ?expected, ?current, "commit conflict");
                        let _ = respond_to.send(Err(StoreError::Conflict { view }));
                        continue;
                    }
                    let version = self.commit(view, record);
                    debug!(?view, version, "committed");
                    let _ = respond_to.send(Ok(version));
                }
                StoreRequest::Put { view, record, respond_to } => {
                    let version = self.commit(view, record);
                    debug!(?view, version, "put");
                    let _ = respond_to.send(Ok(version));
                }
            }
        }

        info!(records = self.records.len(), "store actor stopped");
    }

    fn commit(&mut self, view: View, record: MachineRecord) -> Version {
        let version = self.next_version;
        self.next_version += 1;
        self.records.insert(view, (record.clone(), version));
        // Fire-and-forget: no subscribers is fine.
        let _ = self.changes.send(RecordChange { view, record });
        version
    }
}

/// Clonable handle to the store actor.
#[derive(Clone)]
pub struct MemoryStore {
    sender: mpsc::Sender<StoreRequest>,
    changes: broadcast::Sender<RecordChange>,
}

impl MemoryStore {
    /// Spawns the store actor and returns its handle plus the task handle.
    pub fn spawn(capacity: usize) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let (changes, _) = broadcast::channel(capacity);
        let actor = StoreActor {
            receiver,
            records: HashMap::new(),
            next_version: 1,
            changes: changes.clone(),
        };
        let handle = tokio::spawn(actor.run());
        (Self { sender, changes }, handle)
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(Response<T>) -> StoreRequest,
    ) -> Result<T, StoreError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| StoreError::Closed)?;
        response.await.map_err(|_| StoreError::Closed)?
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn read(&self, view: View) -> Result<Option<(MachineRecord, Version)>, StoreError> {
        self.request(|respond_to| StoreRequest::Read { view, respond_to })
            .await
    }

    async fn compare_and_put(
        &self,
        view: View,
        expected: Option<Version>,
        record: MachineRecord,
    ) -> Result<Version, StoreError> {
        self.request(|respond_to| StoreRequest::CompareAndPut {
            view,
            expected,
            record,
            respond_to,
        })
        .await
    }

    async fn put(&self, view: View, record: MachineRecord) -> Result<Version, StoreError> {
        self.request(|respond_to| StoreRequest::Put {
            view,
            record,
            respond_to,
        })
        .await
    }

    fn changes(&self) -> broadcast::Receiver<RecordChange> {
        self.changes.subscribe()
    }
}
