//! Territory repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide batch read/insert/update/delete APIs over `territories` storage.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `insert_many` and `update_many` run inside one immediate transaction;
//!   any row failure rolls the whole batch back.
//! - Unique index violations surface as `RepoError::UniqueViolation`, never as
//!   an opaque database error.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::territory::{NewTerritory, Territory, TerritoryId};
use rusqlite::ffi;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Statement, TransactionBehavior};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TERRITORY_COLUMNS: &str = "id, code, name, region_code, created_at, updated_at";
const REQUIRED_COLUMNS: [&str; 6] = ["id", "code", "name", "region_code", "created_at", "updated_at"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Which per-region uniqueness rule a write broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    Code,
    Name,
}

impl Display for UniqueKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code => write!(f, "Code"),
            Self::Name => write!(f, "Name"),
        }
    }
}

/// Repository error for territory persistence and query operations.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("duplicate {key} in region: {detail}")]
    UniqueViolation { key: UniqueKey, detail: String },
    #[error("invalid persisted territory data: {0}")]
    InvalidData(String),
    #[error(
        "connection schema version {actual_version} does not match expected {expected_version}"
    )]
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    #[error("store worker failed: {0}")]
    Worker(String),
}

impl RepoError {
    /// Builds a uniqueness error naming the offending row.
    pub fn unique_violation(key: UniqueKey, territory: &NewTerritory) -> Self {
        let value = match key {
            UniqueKey::Code => territory.code.as_str(),
            UniqueKey::Name => territory.name.as_str(),
        };
        Self::UniqueViolation {
            key,
            detail: format!("{key}={value}, Region={}", territory.region_code),
        }
    }

    fn for_row(self, territory: &NewTerritory) -> Self {
        match self {
            Self::UniqueViolation { key, .. } => Self::unique_violation(key, territory),
            other => other,
        }
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match unique_violation(&value) {
            Some((key, detail)) => Self::UniqueViolation { key, detail },
            None => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Repository interface for batch territory operations.
pub trait TerritoryRepository {
    /// Lists every territory of one region, ordered by code.
    fn fetch_by_region(&self, region_code: &str) -> RepoResult<Vec<Territory>>;
    /// Inserts all rows in one transaction and returns the stored rows.
    fn insert_many(&mut self, territories: &[NewTerritory]) -> RepoResult<Vec<Territory>>;
    /// Updates rows keyed by `(region_code, code)` in one transaction.
    ///
    /// Rows without a matching key are omitted from the result.
    fn update_many(&mut self, territories: &[NewTerritory]) -> RepoResult<Vec<Territory>>;
    /// Deletes rows whose code matches any of `codes` and returns the count.
    fn delete_many_by_codes(&self, codes: &[String]) -> RepoResult<usize>;
}

/// SQLite-backed territory repository.
pub struct SqliteTerritoryRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteTerritoryRepository<'conn> {
    /// Constructs a repository from a migrated, ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Wraps a connection that already passed `ensure_connection_ready`.
    pub(crate) fn from_verified(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl TerritoryRepository for SqliteTerritoryRepository<'_> {
    fn fetch_by_region(&self, region_code: &str) -> RepoResult<Vec<Territory>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TERRITORY_COLUMNS}
             FROM territories
             WHERE region_code = ?1 COLLATE NOCASE
             ORDER BY code COLLATE NOCASE ASC, id ASC;"
        ))?;

        let mut rows = stmt.query([region_code.trim()])?;
        let mut territories = Vec::new();
        while let Some(row) = rows.next()? {
            territories.push(parse_territory_row(row)?);
        }

        Ok(territories)
    }

    fn insert_many(&mut self, territories: &[NewTerritory]) -> RepoResult<Vec<Territory>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut created = Vec::with_capacity(territories.len());
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO territories (id, code, name, region_code)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING {TERRITORY_COLUMNS};"
            ))?;

            for territory in territories {
                let row = insert_row(&mut stmt, territory)
                    .map_err(|err| err.for_row(territory))?;
                created.push(row);
            }
        }

        tx.commit()?;
        Ok(created)
    }

    fn update_many(&mut self, territories: &[NewTerritory]) -> RepoResult<Vec<Territory>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut updated = Vec::with_capacity(territories.len());
        {
            let mut stmt = tx.prepare(&format!(
                "UPDATE territories
                 SET
                    code = ?1,
                    name = ?2,
                    region_code = ?3,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE code = ?1 COLLATE NOCASE
                   AND region_code = ?3 COLLATE NOCASE
                 RETURNING {TERRITORY_COLUMNS};"
            ))?;

            for territory in territories {
                if let Some(row) =
                    update_row(&mut stmt, territory).map_err(|err| err.for_row(territory))?
                {
                    updated.push(row);
                }
            }
        }

        tx.commit()?;
        Ok(updated)
    }

    fn delete_many_by_codes(&self, codes: &[String]) -> RepoResult<usize> {
        let unique: BTreeSet<String> = codes
            .iter()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
            .collect();
        if unique.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; unique.len()].join(", ");
        let sql = format!("DELETE FROM territories WHERE code COLLATE NOCASE IN ({placeholders});");
        let bind_values: Vec<Value> = unique.into_iter().map(Value::Text).collect();

        let deleted = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(deleted)
    }
}

fn insert_row(stmt: &mut Statement<'_>, territory: &NewTerritory) -> RepoResult<Territory> {
    let mut rows = stmt.query(params![
        Uuid::new_v4().to_string(),
        territory.code.as_str(),
        territory.name.as_str(),
        territory.region_code.as_str(),
    ])?;
    let row = rows.next()?.ok_or_else(|| {
        RepoError::InvalidData(format!(
            "insert of territory `{}` returned no row",
            territory.code
        ))
    })?;
    parse_territory_row(row)
}

fn update_row(
    stmt: &mut Statement<'_>,
    territory: &NewTerritory,
) -> RepoResult<Option<Territory>> {
    let mut rows = stmt.query(params![
        territory.code.as_str(),
        territory.name.as_str(),
        territory.region_code.as_str(),
    ])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse_territory_row(row)?)),
        None => Ok(None),
    }
}

fn parse_territory_row(row: &Row<'_>) -> RepoResult<Territory> {
    let id_text: String = row.get("id")?;
    let id = parse_territory_id(&id_text)?;

    let code: String = row.get("code")?;
    if code.trim().is_empty() {
        return Err(RepoError::InvalidData(format!(
            "blank code in territories row `{id_text}`"
        )));
    }

    Ok(Territory {
        id,
        code,
        name: row.get("name")?,
        region_code: row.get("region_code")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_territory_id(value: &str) -> RepoResult<TerritoryId> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{value}` in territories.id"))
    })
}

fn unique_violation(err: &rusqlite::Error) -> Option<(UniqueKey, String)> {
    let rusqlite::Error::SqliteFailure(failure, message) = err else {
        return None;
    };
    if failure.extended_code != ffi::SQLITE_CONSTRAINT_UNIQUE {
        return None;
    }

    let detail = message.clone().unwrap_or_default();
    let key = if detail.contains("territories.name") {
        UniqueKey::Name
    } else {
        UniqueKey::Code
    };
    Some((key, detail))
}

/// Verifies that a connection is migrated and carries the territory schema.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "territories")? {
        return Err(RepoError::MissingRequiredTable("territories"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "territories", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "territories",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
