//! The persisted vending machine record and its status enum.

use serde::{Deserialize, Serialize};

/// Availability status of the vending machine.
///
/// `Empty` doubles as the mutual-exclusion flag for an in-flight order: the
/// admission protocol flips `Available -> Empty` transactionally, and the
/// fulfillment worker restores `Available` once dispensing is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineStatus {
    Available,
    Empty,
}

/// The single persisted vending machine record.
///
/// # Versioned Store
/// This struct is the value stored under the machine's well-known identifier
/// in the [`TransactionStore`](crate::store::TransactionStore). Two views of
/// it exist: the operational view (live status, mutated by the admission and
/// fulfillment protocol) and the configuration view (desired/initial state,
/// read-only to the core).
///
/// `manufacturer` and `model_number` are immutable after creation; `status`
/// is the only field the hot path ever rewrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineRecord {
    pub manufacturer: String,
    pub model_number: String,
    pub status: MachineStatus,
    /// Configuration-side seed value; never touched by the hot path.
    pub number_of_products_available: Option<u64>,
}

impl MachineRecord {
    /// Creates a new operational record with the given status.
    pub fn new(
        manufacturer: impl Into<String>,
        model_number: impl Into<String>,
        status: MachineStatus,
    ) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model_number: model_number.into(),
            status,
            number_of_products_available: None,
        }
    }

    /// Creates a configuration-view record carrying only the seed stock count.
    pub fn configuration(
        manufacturer: impl Into<String>,
        model_number: impl Into<String>,
        products_available: u64,
    ) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            model_number: model_number.into(),
            status: MachineStatus::Available,
            number_of_products_available: Some(products_available),
        }
    }
}
