//! Configuration for a vending machine instance.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tunable parameters for one logical vending machine.
///
/// All fields have defaults matching the reference machine, so tests and the
/// demo can start from `MachineConfig::default()` and override selectively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Display string, immutable after creation.
    pub manufacturer: String,
    /// Display string, immutable after creation.
    pub model_number: String,
    /// Live stock the machine starts with.
    pub initial_stock: u64,
    /// Seed value written to the configuration view at startup.
    pub products_available: u64,
    /// Per-order ceiling; read by the fulfillment task but not enforced.
    pub max_order_items: u64,
    /// Total admission attempts on optimistic-lock conflict (1 initial + retries).
    pub admission_attempts: u32,
    /// Simulated dispensing latency.
    pub dispense_delay: Duration,
    /// Buffer size for the in-memory store actor's request channel.
    pub store_capacity: usize,
    /// Buffer size for the out-of-stock notification channel.
    pub notification_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            manufacturer: "Open Vending Works".to_string(),
            model_number: "Model 1 - Message Passing".to_string(),
            initial_stock: 10,
            products_available: 8,
            max_order_items: 3,
            admission_attempts: 3,
            dispense_delay: Duration::from_millis(5),
            store_capacity: 32,
            notification_capacity: 16,
        }
    }
}
