//! Shared types and the scoring core for the Sniffer platform
//!
//! Everything in this crate is pure computation: reference tables, zone,
//! season and weather classification, the heuristic scoring engine, the
//! feedback weight rules and the analytics aggregator. It is used by the
//! backend and, compiled to WASM, by the browser client for offline scans.

pub mod analytics;
pub mod classify;
pub mod learning;
pub mod models;
pub mod narrative;
pub mod reference;
pub mod scoring;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
