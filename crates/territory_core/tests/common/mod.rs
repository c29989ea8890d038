#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use territory_core::{
    InMemoryTerritoryStore, NewTerritory, RepoError, RepoResult, Territory, TerritoryDto,
    TerritoryStore,
};

/// How the recording store answers write calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Delegate to the in-memory store.
    Persist,
    /// Report success with zero rows.
    ReturnEmpty,
    /// Fail like a lost database connection.
    Fail,
}

/// Store double that counts writes and can simulate empty or failing writes.
pub struct RecordingStore {
    inner: InMemoryTerritoryStore,
    mode: WriteMode,
    writes: AtomicUsize,
    last_write: std::sync::Mutex<Vec<NewTerritory>>,
}

impl RecordingStore {
    pub fn new(mode: WriteMode) -> Self {
        Self {
            inner: InMemoryTerritoryStore::new(),
            mode,
            writes: AtomicUsize::new(0),
            last_write: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Seeds rows directly, bypassing the write counter.
    pub async fn seed(&self, rows: &[(&str, &str, &str)]) {
        let rows = rows
            .iter()
            .map(|(code, name, region)| NewTerritory::new(code, name, region))
            .collect();
        self.inner.insert_many(rows).await.unwrap();
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn last_write(&self) -> Vec<NewTerritory> {
        self.last_write.lock().unwrap().clone()
    }

    pub async fn stored(&self) -> Vec<Territory> {
        self.inner.snapshot().await
    }

    fn record(&self, territories: &[NewTerritory]) {
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.last_write.lock().unwrap() = territories.to_vec();
    }
}

#[async_trait]
impl TerritoryStore for RecordingStore {
    async fn fetch_by_region(&self, region_code: &str) -> RepoResult<Vec<Territory>> {
        self.inner.fetch_by_region(region_code).await
    }

    async fn insert_many(&self, territories: Vec<NewTerritory>) -> RepoResult<Vec<Territory>> {
        self.record(&territories);
        match self.mode {
            WriteMode::Persist => self.inner.insert_many(territories).await,
            WriteMode::ReturnEmpty => Ok(Vec::new()),
            WriteMode::Fail => Err(RepoError::Worker("connection reset".to_string())),
        }
    }

    async fn update_many(&self, territories: Vec<NewTerritory>) -> RepoResult<Vec<Territory>> {
        self.record(&territories);
        match self.mode {
            WriteMode::Persist => self.inner.update_many(territories).await,
            WriteMode::ReturnEmpty => Ok(Vec::new()),
            WriteMode::Fail => Err(RepoError::Worker("connection reset".to_string())),
        }
    }

    async fn delete_many_by_codes(&self, codes: Vec<String>) -> RepoResult<usize> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            WriteMode::Persist => self.inner.delete_many_by_codes(codes).await,
            WriteMode::ReturnEmpty => Ok(0),
            WriteMode::Fail => Err(RepoError::Worker("connection reset".to_string())),
        }
    }
}

pub fn dto(code: &str, name: &str, region: &str) -> Option<TerritoryDto> {
    Some(TerritoryDto::new(code, name, region))
}
