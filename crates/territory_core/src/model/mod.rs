//! Territory domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Separate the persisted row from the caller-facing record.
//!
//! # Invariants
//! - Regions are partition keys only; this crate never persists a region row.
//! - Deletion is physical; there are no tombstones.

pub mod territory;
