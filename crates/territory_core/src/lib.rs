//! Core domain logic for the territory reference store.
//! This crate is the single source of truth for territory invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod response;
pub mod service;
pub mod store;

pub use config::{AppConfig, StoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::territory::{NewTerritory, Territory, TerritoryBatch, TerritoryDto, TerritoryId};
pub use repo::territory_repo::{
    RepoError, RepoResult, SqliteTerritoryRepository, TerritoryRepository, UniqueKey,
};
pub use response::{ApiResponse, FailureKind, StatusClass, SuccessKind};
pub use service::territory_service::{ServiceError, TerritoryService};
pub use store::{InMemoryTerritoryStore, SqliteTerritoryStore, TerritoryStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
