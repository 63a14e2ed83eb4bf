//! The transactional store boundary.
//!
//! The core is written against [`TransactionStore`], an abstract
//! optimistic-concurrency key-value contract: point reads return a version
//! token, and `compare_and_put` commits only if the view's version still
//! matches the one observed by the read. The in-memory [`MemoryStore`] actor
//! is the default implementation; tests inject a [`ScriptedStore`] to force
//! conflicts and backend failures deterministically.
//!
//! # Main Components
//!
//! - [`TransactionStore`] - The abstract store contract.
//! - [`MemoryStore`] - Actor-backed in-memory implementation.
//! - [`StoreError`] - Conflict / closed / backend failure taxonomy.
//!
//! # Testing
//!
//! See the [`mock`] module for the scripted store used to exercise retry and
//! failure paths without a real backend.

pub mod memory;
pub mod mock;

pub use memory::*;
pub use mock::*;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::model::MachineRecord;

/// Monotonically increasing per-view commit version.
pub type Version = u64;

/// The two logical views of the single machine record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    /// Live state, mutated by the admission/fulfillment protocol.
    Operational,
    /// Desired/initial state, read-only to the core.
    Configuration,
}

/// A committed write, delivered on the store's change feed.
#[derive(Debug, Clone)]
pub struct RecordChange {
    pub view: View,
    pub record: MachineRecord,
}

/// Errors surfaced by the store.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum StoreError {
    /// Another writer committed between the read and this commit.
    #[error("optimistic lock failure on {view:?} view")]
    Conflict { view: View },

    /// The store actor is gone (channel closed).
    #[error("store is closed")]
    Closed,

    /// Any non-conflict backend failure, propagated verbatim.
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// True for the transient optimistic-lock failure that admission retries.
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Abstract optimistic-concurrency store for the machine record.
///
/// Implementations must linearize `compare_and_put` calls per view: of two
/// commits staged against the same observed version, exactly one succeeds and
/// the other gets [`StoreError::Conflict`].
#[async_trait]
pub trait TransactionStore: Send + Sync + 'static {
    /// Point read; `None` means no record has been written to this view yet.
    async fn read(&self, view: View) -> Result<Option<(MachineRecord, Version)>, StoreError>;

    /// Commits `record` only if the view's version still matches `expected`
    /// (`None` meaning "no record existed at read time").
    async fn compare_and_put(
        &self,
        view: View,
        expected: Option<Version>,
        record: MachineRecord,
    ) -> Result<Version, StoreError>;

    /// Unconditional last-writer-wins write (initialization, restore,
    /// shutdown paths).
    async fn put(&self, view: View, record: MachineRecord) -> Result<Version, StoreError>;

    /// Subscribes to the feed of committed writes.
    fn changes(&self) -> broadcast::Receiver<RecordChange>;
}
