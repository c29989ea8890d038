//! Territory use-case service.
//!
//! # Responsibility
//! - Gate batches through validation and duplicate detection.
//! - Check incoming rows against the store before writing.
//! - Delegate persistence to a `TerritoryStore` and shape `ApiResponse`s.
//!
//! # Invariants
//! - A rejected batch never reaches a store write.
//! - Existing rows are fetched per distinct region in the batch.
//! - The read-then-write window is not isolated; store unique violations on
//!   the write path surface as `Conflict`.
//! - Every call logs exactly one outcome event.

use crate::model::territory::{normalize_key, NewTerritory, Territory, TerritoryBatch, TerritoryDto};
use crate::repo::territory_repo::RepoError;
use crate::response::{ApiResponse, FailureKind};
use crate::service::validation::{validate_batch, validate_region_code, BatchRejection};
use crate::store::TerritoryStore;
use log::{error, info, warn};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

pub const CODES_REQUIRED_MESSAGE: &str = "At least one code is required";
pub const SAVE_FAILED_MESSAGE: &str = "Failed while saving territories";
pub const UPDATE_FAILED_MESSAGE: &str = "Failed to update territories";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to retrieve territories";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete territories";
pub const NOTHING_DELETED_MESSAGE: &str = "No territories found for provided codes";

/// Terminal failure of one service call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Empty batch, field rule violation or malformed region code.
    #[error("{0}")]
    InputInvalid(String),
    /// Duplicate key against the store.
    #[error("{0}")]
    Conflict(String),
    /// Delete matched nothing, or update referenced unknown codes.
    #[error("{0}")]
    NotFound(String),
    /// Store fault or fewer rows than expected after a write.
    #[error("{message}")]
    Persistence {
        message: &'static str,
        #[source]
        source: Option<RepoError>,
    },
}

impl ServiceError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::InputInvalid(_) => FailureKind::BadRequest,
            Self::Conflict(_) => FailureKind::Conflict,
            Self::NotFound(_) => FailureKind::NotFound,
            Self::Persistence { .. } => FailureKind::InternalError,
        }
    }

    fn persistence(message: &'static str) -> Self {
        Self::Persistence {
            message,
            source: None,
        }
    }

    /// Maps a store error on a write path; unique violations become conflicts.
    fn from_write(err: RepoError, message: &'static str) -> Self {
        match err {
            RepoError::UniqueViolation { key, detail } => {
                Self::Conflict(format!("Duplicate {key} in region: {detail}"))
            }
            other => Self::from_read(other, message),
        }
    }

    fn from_read(err: RepoError, message: &'static str) -> Self {
        Self::Persistence {
            message,
            source: Some(err),
        }
    }
}

impl From<BatchRejection> for ServiceError {
    fn from(value: BatchRejection) -> Self {
        Self::InputInvalid(value.message())
    }
}

impl<T> From<ServiceError> for ApiResponse<T> {
    fn from(err: ServiceError) -> Self {
        ApiResponse::failure(err.failure_kind(), err.to_string())
    }
}

type ServiceResult<T> = Result<ApiResponse<T>, ServiceError>;

/// Territory service facade over a store implementation.
pub struct TerritoryService<S: TerritoryStore> {
    store: S,
}

impl<S: TerritoryStore> TerritoryService<S> {
    /// Creates a service using the provided store implementation.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists all territories of one region.
    ///
    /// An unknown region is an empty success, never `NotFound`.
    pub async fn list(&self, region_code: &str) -> ApiResponse<Vec<TerritoryDto>> {
        let started_at = Instant::now();
        respond("territory_list", started_at, self.try_list(region_code).await)
    }

    /// Creates a batch of territories atomically.
    pub async fn create_many(&self, records: TerritoryBatch) -> ApiResponse<Vec<TerritoryDto>> {
        let started_at = Instant::now();
        respond("territory_create", started_at, self.try_create_many(records).await)
    }

    /// Updates a batch of existing territories keyed by code.
    pub async fn update_many(&self, records: TerritoryBatch) -> ApiResponse<Vec<TerritoryDto>> {
        let started_at = Instant::now();
        respond("territory_update", started_at, self.try_update_many(records).await)
    }

    /// Deletes every territory whose code is listed.
    ///
    /// The payload is the number of rows actually removed.
    pub async fn delete_many_by_codes(&self, codes: Vec<String>) -> ApiResponse<usize> {
        let started_at = Instant::now();
        respond(
            "territory_delete",
            started_at,
            self.try_delete_many_by_codes(codes).await,
        )
    }

    async fn try_list(&self, region_code: &str) -> ServiceResult<Vec<TerritoryDto>> {
        validate_region_code(region_code)
            .map_err(|message| ServiceError::InputInvalid(message.to_string()))?;

        let territories = self
            .store
            .fetch_by_region(region_code.trim())
            .await
            .map_err(|err| ServiceError::from_read(err, FETCH_FAILED_MESSAGE))?;

        let items: Vec<TerritoryDto> = territories.into_iter().map(Into::into).collect();
        Ok(ApiResponse::ok(
            format!("Territories retrieved successfully ({} records)", items.len()),
            items,
        ))
    }

    async fn try_create_many(&self, records: TerritoryBatch) -> ServiceResult<Vec<TerritoryDto>> {
        let records = validate_batch(records)?;
        reject_batch_duplicates(&records)?;

        let existing = self.existing_by_region(&records, SAVE_FAILED_MESSAGE).await?;
        reject_store_conflicts(&records, &existing)?;

        let entities: Vec<NewTerritory> = records.iter().map(NewTerritory::from).collect();
        let created = self
            .store
            .insert_many(entities)
            .await
            .map_err(|err| ServiceError::from_write(err, SAVE_FAILED_MESSAGE))?;
        if created.is_empty() {
            return Err(ServiceError::persistence(SAVE_FAILED_MESSAGE));
        }

        let items: Vec<TerritoryDto> = created.into_iter().map(Into::into).collect();
        Ok(ApiResponse::created(
            format!("Territories created successfully ({} records)", items.len()),
            items,
        ))
    }

    async fn try_update_many(&self, records: TerritoryBatch) -> ServiceResult<Vec<TerritoryDto>> {
        let records = validate_batch(records)?;
        reject_batch_duplicates(&records)?;

        let existing = self
            .existing_by_region(&records, UPDATE_FAILED_MESSAGE)
            .await?;
        let missing = missing_codes(&records, &existing);
        if !missing.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "Some territories do not exist: {}",
                missing.join(", ")
            )));
        }

        let entities: Vec<NewTerritory> = records.iter().map(NewTerritory::from).collect();
        let updated = self
            .store
            .update_many(entities)
            .await
            .map_err(|err| ServiceError::from_write(err, UPDATE_FAILED_MESSAGE))?;
        if updated.is_empty() {
            return Err(ServiceError::persistence(UPDATE_FAILED_MESSAGE));
        }

        let items: Vec<TerritoryDto> = updated.into_iter().map(Into::into).collect();
        Ok(ApiResponse::ok(
            format!("Territories updated successfully ({} records)", items.len()),
            items,
        ))
    }

    async fn try_delete_many_by_codes(&self, codes: Vec<String>) -> ServiceResult<usize> {
        if codes.is_empty() {
            return Err(ServiceError::InputInvalid(CODES_REQUIRED_MESSAGE.to_string()));
        }

        let deleted = self
            .store
            .delete_many_by_codes(codes)
            .await
            .map_err(|err| ServiceError::from_read(err, DELETE_FAILED_MESSAGE))?;
        if deleted == 0 {
            return Err(ServiceError::NotFound(NOTHING_DELETED_MESSAGE.to_string()));
        }

        Ok(ApiResponse::no_content(
            format!("Deleted {deleted} territories successfully"),
            deleted,
        ))
    }

    /// Fetches stored rows once per distinct normalized region in `records`.
    async fn existing_by_region(
        &self,
        records: &[TerritoryDto],
        failure_message: &'static str,
    ) -> Result<HashMap<String, Vec<Territory>>, ServiceError> {
        let mut existing = HashMap::new();
        for record in records {
            let region = normalize_key(&record.region_code);
            if existing.contains_key(&region) {
                continue;
            }
            let rows = self
                .store
                .fetch_by_region(record.region_code.trim())
                .await
                .map_err(|err| ServiceError::from_read(err, failure_message))?;
            existing.insert(region, rows);
        }
        Ok(existing)
    }
}

/// Rejects records sharing the same normalized (code, name, region) triple.
fn reject_batch_duplicates(records: &[TerritoryDto]) -> Result<(), ServiceError> {
    let mut counts: Vec<(&TerritoryDto, usize)> = Vec::new();
    let mut index_by_key: HashMap<(String, String, String), usize> = HashMap::new();

    for record in records {
        let key = (
            normalize_key(&record.code),
            normalize_key(&record.name),
            normalize_key(&record.region_code),
        );
        match index_by_key.get(&key) {
            Some(&index) => counts[index].1 += 1,
            None => {
                index_by_key.insert(key, counts.len());
                counts.push((record, 1));
            }
        }
    }

    let duplicates: Vec<String> = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(record, _)| {
            format!(
                "Code={}, Name={}, Region={}",
                record.code.trim(),
                record.name.trim(),
                record.region_code.trim()
            )
        })
        .collect();

    if duplicates.is_empty() {
        return Ok(());
    }
    Err(ServiceError::InputInvalid(format!(
        "Request contains duplicate territories: {}",
        duplicates.join("; ")
    )))
}

/// Rejects records whose code or name already exists in their region.
fn reject_store_conflicts(
    records: &[TerritoryDto],
    existing: &HashMap<String, Vec<Territory>>,
) -> Result<(), ServiceError> {
    let mut code_duplicates = Vec::new();
    let mut name_duplicates = Vec::new();

    for record in records {
        let region = normalize_key(&record.region_code);
        let Some(rows) = existing.get(&region) else {
            continue;
        };
        let code = normalize_key(&record.code);
        let name = normalize_key(&record.name);

        if rows.iter().any(|row| normalize_key(&row.code) == code) {
            code_duplicates.push(format!(
                "Code={}, Region={}",
                record.code.trim(),
                record.region_code.trim()
            ));
        }
        if rows.iter().any(|row| normalize_key(&row.name) == name) {
            name_duplicates.push(format!(
                "Name={}, Region={}",
                record.name.trim(),
                record.region_code.trim()
            ));
        }
    }

    let mut errors = Vec::new();
    if !code_duplicates.is_empty() {
        errors.push(format!(
            "Duplicate Code in region: {}",
            code_duplicates.join("; ")
        ));
    }
    if !name_duplicates.is_empty() {
        errors.push(format!(
            "Duplicate Name in region: {}",
            name_duplicates.join("; ")
        ));
    }

    if errors.is_empty() {
        return Ok(());
    }
    Err(ServiceError::Conflict(errors.join(" | ")))
}

/// Returns trimmed incoming codes absent from their region, first-seen order.
fn missing_codes(
    records: &[TerritoryDto],
    existing: &HashMap<String, Vec<Territory>>,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut missing = Vec::new();

    for record in records {
        let code = normalize_key(&record.code);
        let found = existing
            .get(&normalize_key(&record.region_code))
            .is_some_and(|rows| rows.iter().any(|row| normalize_key(&row.code) == code));
        if !found && seen.insert(code) {
            missing.push(record.code.trim().to_string());
        }
    }
    missing
}

fn respond<T>(event: &str, started_at: Instant, outcome: ServiceResult<T>) -> ApiResponse<T> {
    let duration_ms = started_at.elapsed().as_millis();
    match outcome {
        Ok(response) => {
            info!(
                "event={} module=service status=ok status_code={} duration_ms={}",
                event,
                response.status_code(),
                duration_ms
            );
            response
        }
        Err(err @ ServiceError::Persistence { .. }) => {
            let cause = match &err {
                ServiceError::Persistence {
                    source: Some(source),
                    ..
                } => source.to_string(),
                _ => "empty write result".to_string(),
            };
            error!(
                "event={} module=service status=error status_code=500 duration_ms={} error={}",
                event, duration_ms, cause
            );
            err.into()
        }
        Err(err) => {
            let response: ApiResponse<T> = err.into();
            warn!(
                "event={} module=service status=rejected status_code={} duration_ms={}",
                event,
                response.status_code(),
                duration_ms
            );
            response
        }
    }
}
