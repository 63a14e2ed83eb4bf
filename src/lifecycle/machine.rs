use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

use crate::admission::AdmissionController;
use crate::config::MachineConfig;
use crate::counters::MachineCounters;
use crate::error::OrderError;
use crate::fulfillment::{FulfillmentJob, FulfillmentWorker};
use crate::model::OrderRequest;
use crate::notify::{Notification, Notifications};
use crate::repository::MachineRepository;
use crate::store::{MemoryStore, StoreError, TransactionStore, View};

/// The main runtime orchestrator for one logical vending machine.
///
/// `VendingMachine` is responsible for:
/// - **Lifecycle Management**: seeding both record views at start, tearing
///   the worker and listener down at shutdown
/// - **Dependency Wiring**: threading the one [`MachineCounters`] owner and
///   the shared repository into admission and fulfillment
/// - **The Request Surface**: `make_order` / `refill_item`, the crate's RPC
///   boundary
///
/// # Example
///
/// ```ignore
/// let machine = VendingMachine::start(MachineConfig::default()).await?;
/// machine.make_order(OrderRequest::new("cola", 1)).await?;
/// machine.refill_item(10);
/// machine.shutdown().await?;
/// ```
pub struct VendingMachine {
    admission: AdmissionController,
    fulfillment: mpsc::Sender<FulfillmentJob>,
    counters: Arc<MachineCounters>,
    repository: MachineRepository,
    notifications: Notifications,
    /// Task handles for the worker and (when owned) the store actor.
    handles: Vec<JoinHandle<()>>,
    /// Aborted on shutdown: an externally owned store keeps its change feed
    /// open indefinitely, so the listener cannot drain to completion.
    listener: JoinHandle<()>,
}

impl VendingMachine {
    /// Starts a machine backed by its own in-memory store actor.
    pub async fn start(config: MachineConfig) -> Result<Self, StoreError> {
        let (store, store_handle) = MemoryStore::spawn(config.store_capacity);
        let mut machine = Self::start_with_store(Arc::new(store), config).await?;
        machine.handles.push(store_handle);
        Ok(machine)
    }

    /// Starts a machine against an externally owned store.
    ///
    /// Both record views are written unconditionally, without reading first:
    /// last-writer-wins against any pre-existing record.
    pub async fn start_with_store(
        store: Arc<dyn TransactionStore>,
        config: MachineConfig,
    ) -> Result<Self, StoreError> {
        let counters = Arc::new(MachineCounters::new(&config));
        let repository = MachineRepository::new(store.clone(), &config);
        let notifications = Notifications::new(config.notification_capacity);

        repository.seed_operational().await?;
        repository.seed_configuration(config.products_available).await?;
        info!(
            manufacturer = %config.manufacturer,
            model_number = %config.model_number,
            initial_stock = config.initial_stock,
            "vending machine initialized"
        );

        let (worker, fulfillment) = FulfillmentWorker::new(
            repository.clone(),
            counters.clone(),
            notifications.clone(),
            config.dispense_delay,
        );
        let worker_handle = tokio::spawn(worker.run());
        let listener = tokio::spawn(watch_configuration(store.changes()));

        let admission = AdmissionController::new(
            repository.clone(),
            counters.clone(),
            config.admission_attempts,
        );

        Ok(Self {
            admission,
            fulfillment,
            counters,
            repository,
            notifications,
            handles: vec![worker_handle],
            listener,
        })
    }

    /// Places an order.
    ///
    /// Runs the admission protocol, hands the admitted order to the
    /// fulfillment queue, and resolves once fulfillment completes. Every call
    /// resolves exactly once: success, or one of `OutOfStock`, `InUse`,
    /// `Conflict`, `Store`.
    #[instrument(skip(self))]
    pub async fn make_order(&self, order: OrderRequest) -> Result<(), OrderError> {
        info!(item = %order.item, quantity = order.quantity, "make_order");

        self.admission.admit().await?;

        let (respond_to, response) = oneshot::channel();
        self.fulfillment
            .send(FulfillmentJob { order, respond_to })
            .await
            .map_err(|_| OrderError::Store(StoreError::Closed))?;
        response.await.map_err(|_| OrderError::Store(StoreError::Closed))?
    }

    /// Unconditionally overwrites the live stock level.
    ///
    /// No transaction and no coordination with an in-flight fulfillment
    /// decrement; racing writes are last-write-wins. Does not alter the
    /// persisted status.
    #[instrument(skip(self))]
    pub fn refill_item(&self, quantity: u64) {
        info!(quantity, "refill_item");
        self.counters.set_stock_level(quantity);
    }

    /// Current live stock.
    pub fn stock_level(&self) -> u64 {
        self.counters.stock_level()
    }

    /// Total orders fulfilled by this machine.
    pub fn orders_completed(&self) -> u64 {
        self.counters.orders_completed()
    }

    /// Subscribes to out-of-stock notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Gracefully shuts the machine down.
    ///
    /// Issues a final best-effort status write (spawned, not awaited for
    /// correctness), closes the fulfillment queue, stops the configuration
    /// listener, and waits for the worker and store tasks to finish.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("shutting down vending machine");

        let repository = self.repository.clone();
        tokio::spawn(async move {
            if let Err(err) = repository.seed_operational().await {
                error!(error = %err, "final status write failed");
            }
        });

        // Dropping the senders lets each task's loop drain and exit.
        drop(self.admission);
        drop(self.repository);
        drop(self.fulfillment);
        drop(self.notifications);

        self.listener.abort();

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("machine task failed: {:?}", e);
                return Err(format!("machine task failed: {:?}", e));
            }
        }

        info!("vending machine shutdown complete");
        Ok(())
    }
}

/// Logs configuration-view record changes.
///
/// The core observes these writes but does not act on them yet; this is the
/// extension point for applying configuration at runtime.
async fn watch_configuration(mut changes: broadcast::Receiver<crate::store::RecordChange>) {
    loop {
        match changes.recv().await {
            Ok(change) if change.view == View::Configuration => {
                info!(record = ?change.record, "vending machine configuration changed");
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "configuration change feed lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
