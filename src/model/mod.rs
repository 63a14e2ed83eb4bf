//! Pure data structures (DTOs): the persisted [`MachineRecord`] and the
//! inbound [`OrderRequest`].

pub mod order;
pub mod record;

pub use order::*;
pub use record::*;
