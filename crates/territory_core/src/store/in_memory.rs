use super::TerritoryStore;
use crate::model::territory::{normalize_key, NewTerritory, Territory};
use crate::repo::territory_repo::{RepoError, RepoResult, UniqueKey};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory territory store.
///
/// Enforces the same per-region uniqueness rules as the SQLite unique
/// indexes. Batch writes are staged on a copy and swapped in only when every
/// row succeeds.
#[derive(Default, Clone)]
pub struct InMemoryTerritoryStore {
    rows: Arc<RwLock<Vec<Territory>>>,
}

impl InMemoryTerritoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of every stored row.
    pub async fn snapshot(&self) -> Vec<Territory> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl TerritoryStore for InMemoryTerritoryStore {
    async fn fetch_by_region(&self, region_code: &str) -> RepoResult<Vec<Territory>> {
        let region = normalize_key(region_code);
        let rows = self.rows.read().await;
        let mut matched: Vec<Territory> = rows
            .iter()
            .filter(|row| normalize_key(&row.region_code) == region)
            .cloned()
            .collect();
        matched.sort_by_key(|row| normalize_key(&row.code));
        Ok(matched)
    }

    async fn insert_many(&self, territories: Vec<NewTerritory>) -> RepoResult<Vec<Territory>> {
        let mut rows = self.rows.write().await;
        let mut staged = rows.clone();
        let now = epoch_ms();

        let mut created = Vec::with_capacity(territories.len());
        for territory in territories {
            ensure_unique(&staged, None, &territory)?;
            let row = Territory {
                id: Uuid::new_v4(),
                code: territory.code,
                name: territory.name,
                region_code: territory.region_code,
                created_at: now,
                updated_at: now,
            };
            staged.push(row.clone());
            created.push(row);
        }

        *rows = staged;
        Ok(created)
    }

    async fn update_many(&self, territories: Vec<NewTerritory>) -> RepoResult<Vec<Territory>> {
        let mut rows = self.rows.write().await;
        let mut staged = rows.clone();
        let now = epoch_ms();

        let mut updated = Vec::new();
        for territory in territories {
            let Some(index) = staged.iter().position(|row| {
                normalize_key(&row.code) == normalize_key(&territory.code)
                    && normalize_key(&row.region_code) == normalize_key(&territory.region_code)
            }) else {
                continue;
            };

            ensure_unique(&staged, Some(index), &territory)?;
            let row = &mut staged[index];
            row.code = territory.code;
            row.name = territory.name;
            row.region_code = territory.region_code;
            row.updated_at = now;
            updated.push(row.clone());
        }

        *rows = staged;
        Ok(updated)
    }

    async fn delete_many_by_codes(&self, codes: Vec<String>) -> RepoResult<usize> {
        let wanted: HashSet<String> = codes
            .iter()
            .map(|code| normalize_key(code.as_str()))
            .filter(|code| !code.is_empty())
            .collect();

        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|row| !wanted.contains(&normalize_key(&row.code)));
        Ok(before - rows.len())
    }
}

fn ensure_unique(
    rows: &[Territory],
    skip: Option<usize>,
    candidate: &NewTerritory,
) -> RepoResult<()> {
    let region = normalize_key(&candidate.region_code);
    let code = normalize_key(&candidate.code);
    let name = normalize_key(&candidate.name);

    for (index, row) in rows.iter().enumerate() {
        if Some(index) == skip || normalize_key(&row.region_code) != region {
            continue;
        }
        if normalize_key(&row.code) == code {
            return Err(RepoError::unique_violation(UniqueKey::Code, candidate));
        }
        if normalize_key(&row.name) == name {
            return Err(RepoError::unique_violation(UniqueKey::Name, candidate));
        }
    }
    Ok(())
}

fn epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::InMemoryTerritoryStore;
    use crate::model::territory::NewTerritory;
    use crate::repo::territory_repo::{RepoError, UniqueKey};
    use crate::store::TerritoryStore;

    #[tokio::test]
    async fn failed_batch_leaves_store_untouched() {
        let store = InMemoryTerritoryStore::new();
        store
            .insert_many(vec![NewTerritory::new("TA", "Alpha", "AB")])
            .await
            .unwrap();

        let err = store
            .insert_many(vec![
                NewTerritory::new("TB", "Bravo", "AB"),
                NewTerritory::new("ta", "Other", "ab"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            RepoError::UniqueViolation {
                key: UniqueKey::Code,
                ..
            }
        ));
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn update_skips_unknown_codes() {
        let store = InMemoryTerritoryStore::new();
        store
            .insert_many(vec![NewTerritory::new("TA", "Alpha", "AB")])
            .await
            .unwrap();

        let updated = store
            .update_many(vec![
                NewTerritory::new("TA", "Renamed", "AB"),
                NewTerritory::new("ZZ", "Ghost", "AB"),
            ])
            .await
            .unwrap();

        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0].name, "Renamed");
    }

    #[tokio::test]
    async fn same_name_is_allowed_in_other_region() {
        let store = InMemoryTerritoryStore::new();
        store
            .insert_many(vec![
                NewTerritory::new("TA", "Alpha", "AB"),
                NewTerritory::new("TA", "Alpha", "CD"),
            ])
            .await
            .unwrap();

        assert_eq!(store.fetch_by_region("cd").await.unwrap().len(), 1);
    }
}
