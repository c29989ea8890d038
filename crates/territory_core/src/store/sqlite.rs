//! SQLite store adapter.
//!
//! Runs `SqliteTerritoryRepository` on tokio's blocking pool so callers never
//! block an async worker on SQLite I/O.

use super::TerritoryStore;
use crate::config::StoreConfig;
use crate::db::open_with_config;
use crate::model::territory::{NewTerritory, Territory};
use crate::repo::territory_repo::{
    ensure_connection_ready, RepoError, RepoResult, SqliteTerritoryRepository,
    TerritoryRepository,
};
use async_trait::async_trait;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Shared-connection SQLite implementation of `TerritoryStore`.
///
/// Clones share one connection; statements are serialized by the mutex.
#[derive(Clone)]
pub struct SqliteTerritoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTerritoryStore {
    /// Wraps a migrated connection, rejecting connections without the schema.
    pub fn new(conn: Connection) -> RepoResult<Self> {
        ensure_connection_ready(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens, migrates and wraps the database named by `config`.
    pub fn open(config: &StoreConfig) -> RepoResult<Self> {
        Self::new(open_with_config(config)?)
    }

    async fn run<T, F>(&self, job: F) -> RepoResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteTerritoryRepository<'_>) -> RepoResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| RepoError::Worker("sqlite connection mutex poisoned".to_string()))?;
            let mut repo = SqliteTerritoryRepository::from_verified(&mut guard);
            job(&mut repo)
        })
        .await
        .map_err(|err| RepoError::Worker(err.to_string()))?
    }
}

#[async_trait]
impl TerritoryStore for SqliteTerritoryStore {
    async fn fetch_by_region(&self, region_code: &str) -> RepoResult<Vec<Territory>> {
        let region_code = region_code.to_string();
        self.run(move |repo| repo.fetch_by_region(&region_code)).await
    }

    async fn insert_many(&self, territories: Vec<NewTerritory>) -> RepoResult<Vec<Territory>> {
        self.run(move |repo| repo.insert_many(&territories)).await
    }

    async fn update_many(&self, territories: Vec<NewTerritory>) -> RepoResult<Vec<Territory>> {
        self.run(move |repo| repo.update_many(&territories)).await
    }

    async fn delete_many_by_codes(&self, codes: Vec<String>) -> RepoResult<usize> {
        self.run(move |repo| repo.delete_many_by_codes(&codes)).await
    }
}
