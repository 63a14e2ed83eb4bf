//! Runtime orchestration: wiring the store, worker, and listener together,
//! plus tracing setup.

pub mod machine;
pub mod tracing;

pub use machine::*;
pub use tracing::*;
