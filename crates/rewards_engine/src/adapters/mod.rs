// Rust guideline compliant 2026-08-27

//! Concrete adapters for the domain's store ports.
//!
//! The in-memory adapters back the proof-of-concept binary and the unit
//! tests; the SQLite adapter proves the `TransactionHistory` port is
//! swappable without touching the engine crates.

pub mod in_memory_catalog;
pub mod in_memory_history;
pub mod in_memory_rates;
pub mod in_memory_rules;
pub mod sqlite_history;
