//! The `make_order` request payload.

use serde::{Deserialize, Serialize};

/// What the caller wants dispensed.
///
/// `quantity` is carried for the RPC surface but is not enforced against the
/// `max_order_items` ceiling; the machine dispenses one unit per admitted
/// order regardless.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub item: String,
    pub quantity: u64,
}

impl OrderRequest {
    pub fn new(item: impl Into<String>, quantity: u64) -> Self {
        Self {
            item: item.into(),
            quantity,
        }
    }
}
