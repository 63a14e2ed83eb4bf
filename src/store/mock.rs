//! # Scripted Store
//!
//! Utilities for testing the concurrency core in isolation.
//!
//! The optimistic-lock retry path is impossible to hit deterministically
//! against the real [`MemoryStore`](crate::store::MemoryStore), so tests use
//! a [`ScriptedStore`]: every call pops the next scripted reply, and
//! [`ScriptedStore::verify`] asserts the whole script was consumed.
//!
//! # Example
//! ```ignore
//! let store = ScriptedStore::new();
//! store.script_read(Ok(Some((record, 1))));
//! store.script_compare_and_put(Err(StoreError::Conflict { view: View::Operational }));
//! // ... drive the admission controller ...
//! store.verify();
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::model::MachineRecord;
use crate::store::{RecordChange, StoreError, TransactionStore, Version, View};

/// The next reply the scripted store will hand out.
#[derive(Debug)]
enum Reply {
    Read(Result<Option<(MachineRecord, Version)>, StoreError>),
    CompareAndPut(Result<Version, StoreError>),
    Put(Result<Version, StoreError>),
}

/// A [`TransactionStore`] that replays a fixed script of replies.
///
/// Panics on any call the script did not anticipate, so a test failure points
/// straight at the unexpected store interaction.
#[derive(Clone)]
pub struct ScriptedStore {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    changes: broadcast::Sender<RecordChange>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            changes,
        }
    }

    /// Scripts the reply for the next `read` call.
    pub fn script_read(&self, reply: Result<Option<(MachineRecord, Version)>, StoreError>) {
        self.push(Reply::Read(reply));
    }

    /// Scripts the reply for the next `compare_and_put` call.
    pub fn script_compare_and_put(&self, reply: Result<Version, StoreError>) {
        self.push(Reply::CompareAndPut(reply));
    }

    /// Scripts the reply for the next `put` call.
    pub fn script_put(&self, reply: Result<Version, StoreError>) {
        self.push(Reply::Put(reply));
    }

    /// Asserts that every scripted reply was consumed.
    pub fn verify(&self) {
        let replies = self.replies.lock().unwrap();
        if !replies.is_empty() {
            panic!("{} scripted store replies were never consumed", replies.len());
        }
    }

    fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    fn pop(&self, call: &str) -> Reply {
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => reply,
            None => panic!("unscripted store call: {call}"),
        }
    }
}

impl Default for ScriptedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for ScriptedStore {
    async fn read(&self, view: View) -> Result<Option<(MachineRecord, Version)>, StoreError> {
        match self.pop("read") {
            Reply::Read(reply) => reply,
            other => panic!("expected read, script had {other:?} (view {view:?})"),
        }
    }

    async fn compare_and_put(
        &self,
        view: View,
        _expected: Option<Version>,
        _record: MachineRecord,
    ) -> Result<Version, StoreError> {
        match self.pop("compare_and_put") {
            Reply::CompareAndPut(reply) => reply,
            other => panic!("expected compare_and_put, script had {other:?} (view {view:?})"),
        }
    }

    async fn put(&self, view: View, _record: MachineRecord) -> Result<Version, StoreError> {
        match self.pop("put") {
            Reply::Put(reply) => reply,
            other => panic!("expected put, script had {other:?} (view {view:?})"),
        }
    }

    fn changes(&self) -> broadcast::Receiver<RecordChange> {
        self.changes.subscribe()
    }
}
