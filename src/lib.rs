//! # Vending Machine Concurrency Core
//!
//! > **Optimistic-concurrency order processing over a versioned store, built on Tokio message passing.**
//!
//! This crate implements a simulated vending machine whose single persisted
//! record is mutated through serialized, retryable operations: orders are
//! admitted via an optimistic read-modify-write protocol, fulfilled through a
//! single-capacity execution queue, and depletion is announced on an
//! asynchronous notification channel.
//!
//! ## Design Philosophy
//!
//! The hard part is the **order admission race**: two concurrent `make_order`
//! calls must never both win. Instead of locking, admission reads the
//! machine's status with a version token and commits the `Available -> Empty`
//! flip with a compare-and-commit write. The store's sequential actor loop is
//! the linearization point, so exactly one committer wins; the loser either
//! retries (on an optimistic-lock conflict, up to a fixed budget) or fails
//! fast with a business rejection (`InUse`, `OutOfStock`).
//!
//! ## Concurrency Model
//!
//! Three tasks cooperate per machine:
//! - the **store actor** owns the versioned record and serializes commits,
//! - the **fulfillment worker** drains a capacity-1 queue, so at most one
//!   dispense is ever in flight,
//! - the **configuration listener** logs writes to the configuration view.
//!
//! Admission runs on the caller's task and suspends only on store
//! round-trips. Runtime counters (stock, completed orders) live in one
//! explicitly owned [`counters::MachineCounters`] shared by admission and
//! fulfillment via atomics.
//!
//! ## Module Tour
//!
//! - [`store`] - The transactional boundary: the [`store::TransactionStore`]
//!   contract, the in-memory store actor, and the scripted test store.
//! - [`repository`] - Maps the machine record to/from the store's two views.
//! - [`admission`] - The bounded optimistic retry loop.
//! - [`fulfillment`] - The single-slot dispensing worker.
//! - [`lifecycle`] - [`lifecycle::VendingMachine`], the orchestrator and
//!   request surface, plus tracing setup.
//! - [`model`], [`config`], [`counters`], [`notify`], [`error`] - DTOs,
//!   tunables, shared counters, the out-of-stock channel, and the caller
//!   error taxonomy.
//!
//! ## Quick Start
//!
//! ```ignore
//! use vending_machine::config::MachineConfig;
//! use vending_machine::lifecycle::VendingMachine;
//! use vending_machine::model::OrderRequest;
//!
//! let machine = VendingMachine::start(MachineConfig::default()).await?;
//! machine.make_order(OrderRequest::new("cola", 1)).await?;
//! assert_eq!(machine.stock_level(), 9);
//! machine.shutdown().await?;
//! ```
//!
//! Run the tests with `cargo test`; set `RUST_LOG=vending_machine=debug` to
//! watch the admission protocol retry under contention.

pub mod admission;
pub mod config;
pub mod counters;
pub mod error;
pub mod fulfillment;
pub mod lifecycle;
pub mod model;
pub mod notify;
pub mod repository;
pub mod store;
