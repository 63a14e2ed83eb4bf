//! Integration tests driving the full machine against a scripted store.
//!
//! Pattern: real façade, worker, and repository; mocked store. This is the
//! only way to hit the optimistic-lock retry path deterministically.

use std::sync::Arc;
use std::time::Duration;

use vending_machine::config::MachineConfig;
use vending_machine::error::OrderError;
use vending_machine::lifecycle::VendingMachine;
use vending_machine::model::{MachineRecord, MachineStatus, OrderRequest};
use vending_machine::store::{ScriptedStore, StoreError, View};

fn test_config() -> MachineConfig {
    MachineConfig {
        dispense_delay: Duration::from_millis(1),
        ..MachineConfig::default()
    }
}

fn available(version: u64) -> Result<Option<(MachineRecord, u64)>, StoreError> {
    Ok(Some((
        MachineRecord::new("Open Vending Works", "Model 1", MachineStatus::Available),
        version,
    )))
}

fn conflict() -> StoreError {
    StoreError::Conflict {
        view: View::Operational,
    }
}

/// The happy path makes exactly four store calls after the two seed writes:
/// read, commit, and the worker's restore put.
#[tokio::test]
async fn test_order_succeeds_after_one_conflict_retry() {
    let store = ScriptedStore::new();
    // Startup seeds.
    store.script_put(Ok(1));
    store.script_put(Ok(2));
    // First attempt loses the commit race, second wins.
    store.script_read(available(3));
    store.script_compare_and_put(Err(conflict()));
    store.script_read(available(4));
    store.script_compare_and_put(Ok(5));
    // Fulfillment restores availability.
    store.script_put(Ok(6));

    let machine = VendingMachine::start_with_store(Arc::new(store.clone()), test_config())
        .await
        .unwrap();

    machine.make_order(OrderRequest::new("cola", 1)).await.unwrap();
    assert_eq!(machine.stock_level(), 9);
    assert_eq!(machine.orders_completed(), 1);
    store.verify();
}

/// A conflict on every attempt exhausts the budget: three attempts, then a
/// terminal Conflict carrying the underlying optimistic-lock detail.
#[tokio::test]
async fn test_conflict_budget_exhaustion_is_terminal() {
    let store = ScriptedStore::new();
    store.script_put(Ok(1));
    store.script_put(Ok(2));
    for version in 0..3 {
        store.script_read(available(3 + version));
        store.script_compare_and_put(Err(conflict()));
    }

    let machine = VendingMachine::start_with_store(Arc::new(store.clone()), test_config())
        .await
        .unwrap();

    let err = machine
        .make_order(OrderRequest::new("cola", 1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        OrderError::Conflict {
            attempts: 3,
            source: conflict(),
        }
    );

    // No stock was consumed and nothing was dispensed.
    assert_eq!(machine.stock_level(), 10);
    assert_eq!(machine.orders_completed(), 0);
    store.verify();
}

/// Non-conflict commit failures are propagated verbatim, with no retry.
#[tokio::test]
async fn test_store_failure_propagates_verbatim() {
    let store = ScriptedStore::new();
    store.script_put(Ok(1));
    store.script_put(Ok(2));
    store.script_read(available(3));
    store.script_compare_and_put(Err(StoreError::Backend("commit rejected".into())));

    let machine = VendingMachine::start_with_store(Arc::new(store.clone()), test_config())
        .await
        .unwrap();

    let err = machine
        .make_order(OrderRequest::new("cola", 1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        OrderError::Store(StoreError::Backend("commit rejected".into()))
    );
    store.verify();
}

/// A startup seed failure is surfaced by start_with_store itself.
#[tokio::test]
async fn test_seed_failure_fails_startup() {
    let store = ScriptedStore::new();
    store.script_put(Err(StoreError::Backend("store down".into())));

    let err = VendingMachine::start_with_store(Arc::new(store.clone()), test_config())
        .await
        .err()
        .expect("startup must fail when seeding fails");
    assert_eq!(err, StoreError::Backend("store down".into()));
    store.verify();
}
