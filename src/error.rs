//! Error types for the order-processing surface.

use thiserror::Error;

use crate::store::StoreError;

/// Errors a `make_order` caller can observe.
///
/// `OutOfStock` and `InUse` are business rejections: expected outcomes of
/// depletion and contention, never retried. `Conflict` only appears after the
/// admission retry budget is exhausted and carries the underlying
/// optimistic-lock detail. `Store` is a verbatim non-conflict store failure,
/// fatal to that order only.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    /// The machine has no items left.
    #[error("vending machine is out of items")]
    OutOfStock,

    /// Another order is already in progress.
    #[error("vending machine is busy: an order is in progress")]
    InUse,

    /// Every admission attempt hit an optimistic-lock failure.
    #[error("order admission failed after {attempts} attempts: {source}")]
    Conflict {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// Non-conflict store failure, propagated verbatim.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}
