//! Simulated vendor backend.
//!
//! Serves `VendorBackend.GetQuote`: sleeps for a heavy-tailed latency draw,
//! then prices the product from a keyword catalog (hash-derived for unknown
//! products) with per-call variance. No errors are injected; a cancelled
//! call simply never answers, which the caller sees as a deadline.

pub mod catalog;
pub mod config;
pub mod service;
pub mod simulate;

pub use config::VendorConfig;
pub use service::VendorService;
