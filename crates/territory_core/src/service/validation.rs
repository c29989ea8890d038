//! Territory validation rules.
//!
//! # Responsibility
//! - Check every field rule of one candidate territory.
//! - Reduce a whole batch to its distinct violation messages.
//!
//! # Invariants
//! - Rules are evaluated in declaration order and never short-circuit, so all
//!   violations of a record surface together.
//! - An empty batch or an absent element short-circuits with
//!   `BATCH_REQUIRED_MESSAGE` before any field rule runs.

use crate::model::territory::{TerritoryBatch, TerritoryDto};
use once_cell::sync::Lazy;
use regex::Regex;

pub const CODE_MIN_LEN: usize = 2;
pub const CODE_MAX_LEN: usize = 10;
pub const REGION_CODE_LEN: usize = 2;

pub const BATCH_REQUIRED_MESSAGE: &str = "At least one territory is required";
pub const REGION_REQUIRED_MESSAGE: &str = "Region code is required";
pub const REGION_FORMAT_MESSAGE: &str = "Region code should be two letters";

static LETTERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+$").expect("valid letters regex"));
static LETTERS_AND_SPACES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z\s]+$").expect("valid letters and spaces regex"));

/// Territory field a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Code,
    Name,
    RegionCode,
}

impl Field {
    fn value(self, dto: &TerritoryDto) -> &str {
        match self {
            Self::Code => dto.code.as_str(),
            Self::Name => dto.name.as_str(),
            Self::RegionCode => dto.region_code.as_str(),
        }
    }
}

/// One failed rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Violation {
    pub field: Field,
    pub message: &'static str,
}

struct Rule {
    field: Field,
    message: &'static str,
    check: fn(&str) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        field: Field::Code,
        message: "Code is required",
        check: is_present,
    },
    Rule {
        field: Field::Code,
        message: "Code must be between 2 and 10 characters",
        check: has_code_length,
    },
    Rule {
        field: Field::Code,
        message: "Code must contain only letters",
        check: is_letters,
    },
    Rule {
        field: Field::Name,
        message: "Name is required",
        check: is_present,
    },
    Rule {
        field: Field::Name,
        message: "Name must contain only letters and spaces",
        check: is_letters_and_spaces,
    },
    Rule {
        field: Field::RegionCode,
        message: "RegionCode is required",
        check: is_present,
    },
    Rule {
        field: Field::RegionCode,
        message: "RegionCode must be exactly 2 letters",
        check: has_region_length,
    },
    Rule {
        field: Field::RegionCode,
        message: "RegionCode must contain only letters",
        check: is_letters,
    },
];

/// Why a batch was rejected before reaching the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchRejection {
    /// Batch is empty or holds an absent element.
    Missing,
    /// Distinct violation messages in first-seen order.
    Invalid(Vec<&'static str>),
}

impl BatchRejection {
    pub fn message(&self) -> String {
        match self {
            Self::Missing => BATCH_REQUIRED_MESSAGE.to_string(),
            Self::Invalid(messages) => messages.join("; "),
        }
    }
}

/// Runs every field rule against one territory.
pub fn validate_territory(dto: &TerritoryDto) -> Vec<Violation> {
    RULES
        .iter()
        .filter(|rule| !(rule.check)(rule.field.value(dto)))
        .map(|rule| Violation {
            field: rule.field,
            message: rule.message,
        })
        .collect()
}

/// Validates a whole batch and unwraps its elements on success.
pub fn validate_batch(batch: TerritoryBatch) -> Result<Vec<TerritoryDto>, BatchRejection> {
    if batch.is_empty() || batch.iter().any(Option::is_none) {
        return Err(BatchRejection::Missing);
    }
    let records: Vec<TerritoryDto> = batch.into_iter().flatten().collect();

    let mut messages: Vec<&'static str> = Vec::new();
    for violation in records.iter().flat_map(validate_territory) {
        if !messages.contains(&violation.message) {
            messages.push(violation.message);
        }
    }

    if messages.is_empty() {
        Ok(records)
    } else {
        Err(BatchRejection::Invalid(messages))
    }
}

/// Checks a region code used as a list filter.
pub fn validate_region_code(region_code: &str) -> Result<(), &'static str> {
    if region_code.trim().is_empty() {
        return Err(REGION_REQUIRED_MESSAGE);
    }
    if !has_region_length(region_code) || !is_letters(region_code) {
        return Err(REGION_FORMAT_MESSAGE);
    }
    Ok(())
}

fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

fn has_code_length(value: &str) -> bool {
    (CODE_MIN_LEN..=CODE_MAX_LEN).contains(&value.chars().count())
}

fn has_region_length(value: &str) -> bool {
    value.chars().count() == REGION_CODE_LEN
}

fn is_letters(value: &str) -> bool {
    LETTERS_RE.is_match(value)
}

fn is_letters_and_spaces(value: &str) -> bool {
    LETTERS_AND_SPACES_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::{
        validate_batch, validate_region_code, validate_territory, BatchRejection, Field,
        BATCH_REQUIRED_MESSAGE, REGION_FORMAT_MESSAGE, REGION_REQUIRED_MESSAGE,
    };
    use crate::model::territory::TerritoryDto;

    fn fields_with_errors(dto: &TerritoryDto) -> Vec<Field> {
        validate_territory(dto)
            .into_iter()
            .map(|violation| violation.field)
            .collect()
    }

    #[test]
    fn valid_territory_has_no_violations() {
        let dto = TerritoryDto::new("TT", "Valid Territory", "AB");
        assert!(validate_territory(&dto).is_empty());
    }

    #[test]
    fn empty_code_reports_every_code_rule() {
        let dto = TerritoryDto::new("", "Name", "AB");
        let messages: Vec<_> = validate_territory(&dto)
            .into_iter()
            .map(|violation| violation.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Code is required",
                "Code must be between 2 and 10 characters",
                "Code must contain only letters",
            ]
        );
    }

    #[test]
    fn code_longer_than_ten_is_rejected() {
        let dto = TerritoryDto::new("A".repeat(11), "Name", "AB");
        assert_eq!(fields_with_errors(&dto), vec![Field::Code]);
    }

    #[test]
    fn name_with_digits_is_rejected_but_spaces_are_fine() {
        assert_eq!(
            fields_with_errors(&TerritoryDto::new("TB", "Territory1", "AB")),
            vec![Field::Name]
        );
        assert!(fields_with_errors(&TerritoryDto::new("TB", "North Bay", "AB")).is_empty());
    }

    #[test]
    fn region_code_must_be_two_letters() {
        for region in ["A", "ABC", "A1", ""] {
            let dto = TerritoryDto::new("TB", "Name", region);
            assert!(
                fields_with_errors(&dto).contains(&Field::RegionCode),
                "region `{region}` should be rejected"
            );
        }
    }

    #[test]
    fn batch_with_absent_element_short_circuits() {
        let rejection = validate_batch(vec![None]).unwrap_err();
        assert_eq!(rejection, BatchRejection::Missing);
        assert_eq!(rejection.message(), BATCH_REQUIRED_MESSAGE);

        let rejection = validate_batch(Vec::new()).unwrap_err();
        assert_eq!(rejection.message(), BATCH_REQUIRED_MESSAGE);
    }

    #[test]
    fn batch_messages_are_distinct_and_joined() {
        let batch = vec![
            Some(TerritoryDto::new("T1", "Name", "AB")),
            Some(TerritoryDto::new("T2", "Name", "ABC")),
        ];
        let rejection = validate_batch(batch).unwrap_err();
        assert_eq!(
            rejection.message(),
            "Code must contain only letters; RegionCode must be exactly 2 letters"
        );
    }

    #[test]
    fn region_filter_messages_are_rule_specific() {
        assert_eq!(validate_region_code("  "), Err(REGION_REQUIRED_MESSAGE));
        assert_eq!(validate_region_code("123"), Err(REGION_FORMAT_MESSAGE));
        assert_eq!(validate_region_code("A"), Err(REGION_FORMAT_MESSAGE));
        assert_eq!(validate_region_code("ab"), Ok(()));
    }
}
