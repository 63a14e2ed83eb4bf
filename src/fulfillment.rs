//! Fulfillment Worker: the single execution slot that actually dispenses.
//!
//! # Concurrency Model
//! All fulfillment jobs flow through one capacity-1 channel drained by one
//! worker task, so "exactly one fulfillment in flight" is a property of the
//! data structure, not of a thread-pool size. The admission protocol's
//! `Available -> Empty` flip already guarantees no second job arrives while
//! one is running; the channel is an independent second safety net.
//!
//! # Failure Semantics
//! A job never raises to its caller. Once admission succeeded, the caller's
//! pending result always resolves success: the out-of-stock publish is
//! fire-and-forget and the status-restore write is a single attempt whose
//! failure is only logged (the stock decrement is not transactional with the
//! restore, so it is never reverted).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tracing::{debug, error, info, warn};

use crate::counters::MachineCounters;
use crate::error::OrderError;
use crate::model::OrderRequest;
use crate::notify::{Notification, Notifications};
use crate::repository::MachineRepository;

/// One admitted order, waiting for its slot in the execution queue.
#[derive(Debug)]
pub struct FulfillmentJob {
    pub order: OrderRequest,
    /// Resolved exactly once, always with `Ok(())`, after the restore write
    /// is submitted.
    pub respond_to: oneshot::Sender<Result<(), OrderError>>,
}

pub struct FulfillmentWorker {
    receiver: mpsc::Receiver<FulfillmentJob>,
    repository: MachineRepository,
    counters: Arc<MachineCounters>,
    notifications: Notifications,
    dispense_delay: Duration,
}

impl FulfillmentWorker {
    /// Creates the worker and the capacity-1 sender that admission feeds.
    pub fn new(
        repository: MachineRepository,
        counters: Arc<MachineCounters>,
        notifications: Notifications,
        dispense_delay: Duration,
    ) -> (Self, mpsc::Sender<FulfillmentJob>) {
        let (sender, receiver) = mpsc::channel(1);
        let worker = Self {
            receiver,
            repository,
            counters,
            notifications,
            dispense_delay,
        };
        (worker, sender)
    }

    /// Drains the queue until every sender is dropped.
    pub async fn run(mut self) {
        info!("fulfillment worker started");
        while let Some(job) = self.receiver.recv().await {
            self.fulfill(job).await;
        }
        info!("fulfillment worker stopped");
    }

    async fn fulfill(&self, job: FulfillmentJob) {
        // Ceiling is read but not enforced per order; kept as configuration.
        let max_order_items = self.counters.max_order_items();
        debug!(
            item = %job.order.item,
            quantity = job.order.quantity,
            max_order_items,
            "dispensing"
        );

        time::sleep(self.dispense_delay).await;

        let completed = self.counters.record_completed_order();
        let before = self.counters.take_one();
        debug!(completed, stock_level = before.saturating_sub(1), "order dispensed");

        if before == 1 {
            info!("vending machine is out of items");
            self.notifications.publish(Notification::OutOfStock);
        }

        if let Err(err) = self.repository.restore_available().await {
            // Logged only: the caller already consumed a unit of stock and
            // must still see the order as fulfilled.
            error!(error = %err, "failed to restore machine status to available");
        }

        if job.respond_to.send(Ok(())).is_err() {
            warn!("order caller went away before fulfillment resolved");
        }
    }
}
