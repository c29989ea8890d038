//! Territory domain model.
//!
//! # Responsibility
//! - Define the persisted territory row and the public record shape.
//! - Provide the trimmed, case-folded keys used for uniqueness checks.
//!
//! # Invariants
//! - Within one region no two rows share a code or a name, compared with
//!   `normalize_key`.
//! - `id`, `created_at` and `updated_at` are assigned by the store only.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned identifier of a persisted territory.
pub type TerritoryId = Uuid;

/// Persisted territory row, as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    pub id: TerritoryId,
    /// Business key, unique inside `region_code`.
    pub code: String,
    pub name: String,
    pub region_code: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

/// Territory values submitted to the store for insert or keyed update.
///
/// Values are trimmed on construction so persisted rows never carry
/// surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTerritory {
    pub code: String,
    pub name: String,
    pub region_code: String,
}

impl NewTerritory {
    pub fn new(
        code: impl AsRef<str>,
        name: impl AsRef<str>,
        region_code: impl AsRef<str>,
    ) -> Self {
        Self {
            code: code.as_ref().trim().to_string(),
            name: name.as_ref().trim().to_string(),
            region_code: region_code.as_ref().trim().to_string(),
        }
    }
}

impl From<&TerritoryDto> for NewTerritory {
    fn from(dto: &TerritoryDto) -> Self {
        Self::new(&dto.code, &dto.name, &dto.region_code)
    }
}

/// Public territory record exchanged with callers.
///
/// Missing fields deserialize as empty strings so they surface as
/// validation messages instead of decode failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TerritoryDto {
    pub code: String,
    pub name: String,
    pub region_code: String,
}

impl TerritoryDto {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        region_code: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            region_code: region_code.into(),
        }
    }
}

impl From<Territory> for TerritoryDto {
    fn from(territory: Territory) -> Self {
        Self {
            code: territory.code,
            name: territory.name,
            region_code: territory.region_code,
        }
    }
}

/// Incoming batch; `None` stands for an absent element in the request.
pub type TerritoryBatch = Vec<Option<TerritoryDto>>;

/// Trims and upper-cases a code, name or region for comparison.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::{normalize_key, NewTerritory, TerritoryDto};

    #[test]
    fn new_territory_trims_all_fields() {
        let dto = TerritoryDto::new(" TB ", "  North Bay ", "ab ");
        let entity = NewTerritory::from(&dto);
        assert_eq!(entity.code, "TB");
        assert_eq!(entity.name, "North Bay");
        assert_eq!(entity.region_code, "ab");
    }

    #[test]
    fn normalize_key_ignores_case_and_padding() {
        assert_eq!(normalize_key(" north bay "), normalize_key("NORTH BAY"));
    }

    #[test]
    fn dto_deserializes_missing_fields_as_empty() {
        let dto: TerritoryDto = serde_json::from_str(r#"{"code":"TB"}"#).unwrap();
        assert_eq!(dto.code, "TB");
        assert!(dto.name.is_empty());
        assert!(dto.region_code.is_empty());
    }
}
