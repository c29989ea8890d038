//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define batch-oriented data access contracts for territories.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository APIs return semantic errors (`UniqueViolation`) in addition to
//!   DB transport errors.

pub mod territory_repo;
