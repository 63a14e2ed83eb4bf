//! Machine State Repository: maps the logical device record to and from the
//! transactional store.
//!
//! The repository is the only component that knows the record's identity
//! fields and which [`View`] holds what. It exposes exactly the operations
//! the protocol needs: a versioned status read, a compare-and-commit status
//! write, the unconditional restore/seed writes, and nothing else. Failures
//! are reported to the caller, never swallowed here.

use std::sync::Arc;

use tracing::debug;

use crate::config::MachineConfig;
use crate::model::{MachineRecord, MachineStatus};
use crate::store::{StoreError, TransactionStore, Version, View};

#[derive(Clone)]
pub struct MachineRepository {
    store: Arc<dyn TransactionStore>,
    manufacturer: String,
    model_number: String,
}

impl MachineRepository {
    pub fn new(store: Arc<dyn TransactionStore>, config: &MachineConfig) -> Self {
        Self {
            store,
            manufacturer: config.manufacturer.clone(),
            model_number: config.model_number.clone(),
        }
    }

    /// Reads the operational status and its version token.
    ///
    /// An absent record is treated as `Available` with no prior version, so
    /// the very first admission commits against `expected = None`.
    pub async fn read_status(&self) -> Result<(MachineStatus, Option<Version>), StoreError> {
        let found = self.store.read(View::Operational).await?;
        let (status, version) = match found {
            Some((record, version)) => (record.status, Some(version)),
            None => (MachineStatus::Available, None),
        };
        debug!(?status, ?version, "read machine status");
        Ok((status, version))
    }

    /// Stages the full record (identity unchanged, status updated) against
    /// the version observed by the matching [`read_status`](Self::read_status).
    ///
    /// Fails with [`StoreError::Conflict`] if another writer committed first.
    pub async fn commit_status(
        &self,
        status: MachineStatus,
        expected: Option<Version>,
    ) -> Result<Version, StoreError> {
        self.store
            .compare_and_put(View::Operational, expected, self.operational_record(status))
            .await
    }

    /// Unconditionally writes the machine back to `Available`.
    ///
    /// Single attempt, no retry loop: the fulfillment worker owns the failure
    /// handling for this write.
    pub async fn restore_available(&self) -> Result<Version, StoreError> {
        self.store
            .put(View::Operational, self.operational_record(MachineStatus::Available))
            .await
    }

    /// Startup write of the operational view: `Available`, last-writer-wins.
    pub async fn seed_operational(&self) -> Result<Version, StoreError> {
        self.store
            .put(View::Operational, self.operational_record(MachineStatus::Available))
            .await
    }

    /// Startup write of the configuration view with the seed stock count.
    pub async fn seed_configuration(&self, products_available: u64) -> Result<Version, StoreError> {
        let record = MachineRecord::configuration(
            self.manufacturer.clone(),
            self.model_number.clone(),
            products_available,
        );
        self.store.put(View::Configuration, record).await
    }

    fn operational_record(&self, status: MachineStatus) -> MachineRecord {
        MachineRecord::new(self.manufacturer.clone(), self.model_number.clone(), status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn repository(store: MemoryStore) -> MachineRepository {
        MachineRepository::new(Arc::new(store), &MachineConfig::default())
    }

    #[tokio::test]
    async fn absent_record_reads_as_available_with_no_version() {
        let (store, _handle) = MemoryStore::spawn(8);
        let repo = repository(store);

        let (status, version) = repo.read_status().await.unwrap();
        assert_eq!(status, MachineStatus::Available);
        assert_eq!(version, None);
    }

    #[tokio::test]
    async fn commit_status_preserves_identity() {
        let (store, _handle) = MemoryStore::spawn(8);
        let repo = repository(store.clone());

        repo.seed_operational().await.unwrap();
        let (_, version) = repo.read_status().await.unwrap();
        repo.commit_status(MachineStatus::Empty, version).await.unwrap();

        let (record, _) = store.read(View::Operational).await.unwrap().unwrap();
        let defaults = MachineConfig::default();
        assert_eq!(record.manufacturer, defaults.manufacturer);
        assert_eq!(record.model_number, defaults.model_number);
        assert_eq!(record.status, MachineStatus::Empty);
    }

    #[tokio::test]
    async fn interleaved_write_makes_commit_conflict() {
        let (store, _handle) = MemoryStore::spawn(8);
        let repo = repository(store);

        repo.seed_operational().await.unwrap();
        let (_, version) = repo.read_status().await.unwrap();

        // Another writer lands between our read and commit.
        repo.restore_available().await.unwrap();

        let err = repo
            .commit_status(MachineStatus::Empty, version)
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn seed_configuration_carries_the_stock_count() {
        let (store, _handle) = MemoryStore::spawn(8);
        let repo = repository(store.clone());

        repo.seed_configuration(8).await.unwrap();

        let (record, _) = store.read(View::Configuration).await.unwrap().unwrap();
        assert_eq!(record.number_of_products_available, Some(8));
    }
}
