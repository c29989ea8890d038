//! Async store port consumed by the territory service.
//!
//! # Responsibility
//! - Define the four batch capabilities the service needs from a store.
//! - Provide SQLite and in-memory adapters behind one trait.
//!
//! # Invariants
//! - Adapters own connection lifecycle and transaction demarcation.
//! - `insert_many` and `update_many` are all-or-nothing per call.
//! - Callers must not rely on the order of returned rows.

use crate::model::territory::{NewTerritory, Territory};
use crate::repo::territory_repo::RepoResult;
use async_trait::async_trait;

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryTerritoryStore;
pub use sqlite::SqliteTerritoryStore;

#[async_trait]
pub trait TerritoryStore: Send + Sync {
    async fn fetch_by_region(&self, region_code: &str) -> RepoResult<Vec<Territory>>;
    async fn insert_many(&self, territories: Vec<NewTerritory>) -> RepoResult<Vec<Territory>>;
    async fn update_many(&self, territories: Vec<NewTerritory>) -> RepoResult<Vec<Territory>>;
    async fn delete_many_by_codes(&self, codes: Vec<String>) -> RepoResult<usize>;
}

#[async_trait]
impl<S> TerritoryStore for std::sync::Arc<S>
where
    S: TerritoryStore + ?Sized,
{
    async fn fetch_by_region(&self, region_code: &str) -> RepoResult<Vec<Territory>> {
        (**self).fetch_by_region(region_code).await
    }

    async fn insert_many(&self, territories: Vec<NewTerritory>) -> RepoResult<Vec<Territory>> {
        (**self).insert_many(territories).await
    }

    async fn update_many(&self, territories: Vec<NewTerritory>) -> RepoResult<Vec<Territory>> {
        (**self).update_many(territories).await
    }

    async fn delete_many_by_codes(&self, codes: Vec<String>) -> RepoResult<usize> {
        (**self).delete_many_by_codes(codes).await
    }
}
