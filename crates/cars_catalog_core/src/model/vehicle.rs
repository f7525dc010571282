//! Vehicle and owner domain model.
//!
//! # Responsibility
//! - Define the canonical vehicle/owner records used by write and read paths.
//! - Provide validation helpers enforced before any SQL mutation.
//!
//! # Invariants
//! - `reg_num` is the stable identity of a vehicle and never changes.
//! - Owner identity is `(name, surname, patronymic)`; `patronymic = None` is a
//!   distinct identity, not a wildcard.
//! - `year`, when set, lies in `FIRST_CAR_YEAR..=current calendar year`.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Earliest model year accepted for a vehicle.
pub const FIRST_CAR_YEAR: i32 = 1885;

/// Generated owner row identifier.
pub type OwnerId = i64;

/// Validation failure raised before any database I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleValidationError {
    /// Registration number is empty or whitespace.
    EmptyRegNum,
    /// A required text field is empty or whitespace.
    BlankField(&'static str),
    /// Year is set but outside the accepted range.
    YearOutOfRange { year: i32, max: i32 },
    /// A required column was asked to be cleared.
    ClearRequired(&'static str),
    /// Owner identity is only partly supplied.
    IncompleteOwner(&'static str),
}

impl Display for VehicleValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRegNum => write!(f, "registration number is empty"),
            Self::BlankField(field) => write!(f, "{field} must not be blank"),
            Self::YearOutOfRange { year, max } => {
                write!(f, "year {year} is outside {FIRST_CAR_YEAR}..={max}")
            }
            Self::ClearRequired(field) => write!(f, "{field} is required and cannot be cleared"),
            Self::IncompleteOwner(details) => write!(f, "incomplete owner: {details}"),
        }
    }
}

impl Error for VehicleValidationError {}

/// Registered owner identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub surname: String,
    /// `None` means "no patronymic" and only matches other `None` owners.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patronymic: Option<String>,
}

impl Owner {
    pub fn new(name: impl Into<String>, surname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            surname: surname.into(),
            patronymic: None,
        }
    }

    pub fn with_patronymic(mut self, patronymic: impl Into<String>) -> Self {
        self.patronymic = Some(patronymic.into());
        self
    }

    /// Rejects owners without a usable name/surname pair.
    pub fn validate(&self) -> Result<(), VehicleValidationError> {
        if self.name.trim().is_empty() {
            return Err(VehicleValidationError::BlankField("owner.name"));
        }
        if self.surname.trim().is_empty() {
            return Err(VehicleValidationError::BlankField("owner.surname"));
        }
        Ok(())
    }
}

/// Vehicle as supplied to bulk ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub reg_num: String,
    pub mark: String,
    pub model: String,
    /// `None` or `0` means the model year is unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub owner: Owner,
}

impl Vehicle {
    pub fn new(
        reg_num: impl Into<String>,
        mark: impl Into<String>,
        model: impl Into<String>,
        owner: Owner,
    ) -> Self {
        Self {
            reg_num: reg_num.into(),
            mark: mark.into(),
            model: model.into(),
            year: None,
            owner,
        }
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Validates every field that must hold before persistence.
    pub fn validate(&self) -> Result<(), VehicleValidationError> {
        validate_reg_num(&self.reg_num)?;
        if self.mark.trim().is_empty() {
            return Err(VehicleValidationError::BlankField("mark"));
        }
        if self.model.trim().is_empty() {
            return Err(VehicleValidationError::BlankField("model"));
        }
        if let Some(year) = self.known_year() {
            validate_year(year)?;
        }
        self.owner.validate()
    }

    /// Model year as stored; `0` means unknown.
    pub fn known_year(&self) -> Option<i32> {
        self.year.filter(|year| *year != 0)
    }
}

/// Vehicle joined with its owner, as returned by read paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleRecord {
    pub reg_num: String,
    pub mark: String,
    pub model: String,
    pub year: Option<i32>,
    pub owner_id: OwnerId,
    pub owner: Owner,
}

pub fn validate_reg_num(reg_num: &str) -> Result<(), VehicleValidationError> {
    if reg_num.trim().is_empty() {
        Err(VehicleValidationError::EmptyRegNum)
    } else {
        Ok(())
    }
}

pub fn validate_year(year: i32) -> Result<(), VehicleValidationError> {
    let max = current_year();
    if (FIRST_CAR_YEAR..=max).contains(&year) {
        Ok(())
    } else {
        Err(VehicleValidationError::YearOutOfRange { year, max })
    }
}

/// Current calendar year (UTC).
pub fn current_year() -> i32 {
    Utc::now().year()
}
