//! Process-local runtime counters shared by admission and fulfillment.
//!
//! One [`MachineCounters`] instance is owned per logical machine and threaded
//! explicitly (via `Arc`) into both execution contexts; there are no ambient
//! process-wide singletons. All fields are atomics because admission reads
//! `stock_level` outside any transaction boundary while the fulfillment
//! worker decrements it.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::MachineConfig;

#[derive(Debug)]
pub struct MachineCounters {
    stock_level: AtomicU64,
    orders_completed: AtomicU64,
    max_order_items: AtomicU64,
}

impl MachineCounters {
    pub fn new(config: &MachineConfig) -> Self {
        Self {
            stock_level: AtomicU64::new(config.initial_stock),
            orders_completed: AtomicU64::new(0),
            max_order_items: AtomicU64::new(config.max_order_items),
        }
    }

    /// Current live stock.
    pub fn stock_level(&self) -> u64 {
        self.stock_level.load(Ordering::SeqCst)
    }

    /// Unconditionally overwrites the stock level (the `refill_item` path).
    ///
    /// Not coordinated with an in-flight fulfillment decrement; racing writes
    /// are last-write-wins.
    pub fn set_stock_level(&self, quantity: u64) {
        self.stock_level.store(quantity, Ordering::SeqCst);
    }

    pub fn out_of_stock(&self) -> bool {
        self.stock_level() == 0
    }

    /// Removes one unit from stock, saturating at zero.
    ///
    /// Returns the stock level observed *before* the decrement, so the caller
    /// can detect the exact `1 -> 0` depletion transition.
    pub fn take_one(&self) -> u64 {
        self.stock_level
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or(0)
    }

    /// Increments the completed-order counter, returning the new total.
    pub fn record_completed_order(&self) -> u64 {
        self.orders_completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn orders_completed(&self) -> u64 {
        self.orders_completed.load(Ordering::SeqCst)
    }

    pub fn max_order_items(&self) -> u64 {
        self.max_order_items.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_one_saturates_at_zero() {
        let counters = MachineCounters::new(&MachineConfig {
            initial_stock: 1,
            ..MachineConfig::default()
        });

        assert_eq!(counters.take_one(), 1);
        assert_eq!(counters.stock_level(), 0);
        assert!(counters.out_of_stock());

        // Decrementing an empty machine stays at zero.
        assert_eq!(counters.take_one(), 0);
        assert_eq!(counters.stock_level(), 0);
    }

    #[test]
    fn refill_overwrites_unconditionally() {
        let counters = MachineCounters::new(&MachineConfig::default());
        counters.set_stock_level(0);
        counters.set_stock_level(42);
        assert_eq!(counters.stock_level(), 42);
    }

    #[test]
    fn completed_orders_are_monotonic() {
        let counters = MachineCounters::new(&MachineConfig::default());
        assert_eq!(counters.record_completed_order(), 1);
        assert_eq!(counters.record_completed_order(), 2);
        assert_eq!(counters.orders_completed(), 2);
    }
}
