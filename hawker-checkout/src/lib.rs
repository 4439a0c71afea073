//! Checkout engine.
//!
//! Executes a fixed workflow for one order — `reserve → {price ∥ tax} →
//! pay → confirm` — with compensating actions (`void`, `release`) on any
//! failure after a committed step. Per-node lifecycle events append to an
//! order's history and fan out live to status subscribers; a subscriber
//! always sees the full history replay followed by a gap-free tail.
//!
//! State is process-memory only: the order map and the inventory ledger
//! reset on restart.

pub mod config;
pub mod inventory;
pub mod order;
pub mod service;
pub mod workflow;

pub use config::CheckoutConfig;
pub use inventory::Inventory;
pub use order::{Order, OrderBoard};
pub use service::CheckoutService;
pub use workflow::{Workflow, WorkflowTuning};
