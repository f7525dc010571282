//! Partial-update input model.
//!
//! # Responsibility
//! - Represent every updatable field as keep / clear / set.
//! - Decide the owner reassignment policy before any database I/O.
//!
//! # Invariants
//! - `Keep` never touches the stored value.
//! - Blank text and year `0` are read as `Keep`.
//! - Owner reassignment needs both name and surname; one without the other is
//!   rejected, never guessed.

use crate::model::vehicle::{validate_reg_num, validate_year, Owner, VehicleValidationError};

/// Tri-state field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate<T> {
    /// Field not supplied; keep the stored value.
    Keep,
    /// Field explicitly supplied as empty.
    Clear,
    /// Field supplied with a new value.
    Set(T),
}

impl<T> Default for FieldUpdate<T> {
    fn default() -> Self {
        Self::Keep
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Set(value),
            None => Self::Keep,
        }
    }
}

impl<T> FieldUpdate<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Keep | Self::Clear => None,
        }
    }
}

impl FieldUpdate<String> {
    /// Maps loosely-typed text input where an empty string means "omitted".
    pub fn from_text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Keep
        } else {
            Self::Set(value)
        }
    }
}

impl FieldUpdate<i32> {
    /// Maps loosely-typed year input where `0` means "omitted".
    pub fn from_year(year: i32) -> Self {
        if year == 0 {
            Self::Keep
        } else {
            Self::Set(year)
        }
    }
}

/// Owner outcome of a validated patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerChange {
    /// Existing owner reference stays as stored.
    Unchanged,
    /// Resolve (find or create) this owner and point the vehicle at it.
    Reassign(Owner),
}

/// Partial update keyed by registration number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehiclePatch {
    pub reg_num: String,
    pub mark: FieldUpdate<String>,
    pub model: FieldUpdate<String>,
    /// `Clear` stores "unknown year".
    pub year: FieldUpdate<i32>,
    pub owner_name: FieldUpdate<String>,
    pub owner_surname: FieldUpdate<String>,
    /// Only meaningful together with name and surname.
    pub owner_patronymic: FieldUpdate<String>,
}

impl VehiclePatch {
    /// Creates a patch that keeps every field.
    pub fn new(reg_num: impl Into<String>) -> Self {
        Self {
            reg_num: reg_num.into(),
            mark: FieldUpdate::Keep,
            model: FieldUpdate::Keep,
            year: FieldUpdate::Keep,
            owner_name: FieldUpdate::Keep,
            owner_surname: FieldUpdate::Keep,
            owner_patronymic: FieldUpdate::Keep,
        }
    }

    pub fn mark(mut self, mark: impl Into<String>) -> Self {
        self.mark = FieldUpdate::Set(mark.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = FieldUpdate::Set(model.into());
        self
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = FieldUpdate::Set(year);
        self
    }

    pub fn clear_year(mut self) -> Self {
        self.year = FieldUpdate::Clear;
        self
    }

    /// Requests reassignment to `owner` (name, surname and patronymic).
    pub fn owner(mut self, owner: Owner) -> Self {
        self.owner_name = FieldUpdate::Set(owner.name);
        self.owner_surname = FieldUpdate::Set(owner.surname);
        self.owner_patronymic = owner.patronymic.into();
        self
    }

    /// Returns a copy where blank text and year `0` are treated as not supplied.
    pub fn normalized(&self) -> Self {
        Self {
            reg_num: self.reg_num.clone(),
            mark: normalize_text(&self.mark),
            model: normalize_text(&self.model),
            year: match &self.year {
                FieldUpdate::Set(year) => FieldUpdate::from_year(*year),
                other => other.clone(),
            },
            owner_name: normalize_text(&self.owner_name),
            owner_surname: normalize_text(&self.owner_surname),
            owner_patronymic: self.owner_patronymic.clone(),
        }
    }

    /// Validates the patch and returns the owner policy to apply.
    ///
    /// Blank text and year `0` mean "keep"; see [`VehiclePatch::normalized`].
    ///
    /// # Errors
    /// - `EmptyRegNum` when the key is blank.
    /// - `ClearRequired` for mark, model, name or surname.
    /// - `YearOutOfRange` for a set year outside the accepted range.
    /// - `IncompleteOwner` when the owner identity is only partly supplied.
    pub fn validate(&self) -> Result<OwnerChange, VehicleValidationError> {
        let patch = self.normalized();
        validate_reg_num(&patch.reg_num)?;
        reject_clear(&patch.mark, "mark")?;
        reject_clear(&patch.model, "model")?;
        if let FieldUpdate::Set(year) = patch.year {
            validate_year(year)?;
        }
        reject_clear(&patch.owner_name, "owner.name")?;
        reject_clear(&patch.owner_surname, "owner.surname")?;

        match (patch.owner_name, patch.owner_surname) {
            (FieldUpdate::Set(name), FieldUpdate::Set(surname)) => {
                Ok(OwnerChange::Reassign(Owner {
                    name,
                    surname,
                    patronymic: patch.owner_patronymic.as_set().cloned(),
                }))
            }
            (FieldUpdate::Keep, FieldUpdate::Keep) => {
                if patch.owner_patronymic.is_keep() {
                    Ok(OwnerChange::Unchanged)
                } else {
                    Err(VehicleValidationError::IncompleteOwner(
                        "patronymic requires name and surname",
                    ))
                }
            }
            _ => Err(VehicleValidationError::IncompleteOwner(
                "name and surname must be supplied together",
            )),
        }
    }
}

fn normalize_text(value: &FieldUpdate<String>) -> FieldUpdate<String> {
    match value {
        FieldUpdate::Set(text) => FieldUpdate::from_text(text.as_str()),
        FieldUpdate::Keep => FieldUpdate::Keep,
        FieldUpdate::Clear => FieldUpdate::Clear,
    }
}

fn reject_clear(
    value: &FieldUpdate<String>,
    field: &'static str,
) -> Result<(), VehicleValidationError> {
    match value {
        FieldUpdate::Clear => Err(VehicleValidationError::ClearRequired(field)),
        FieldUpdate::Keep | FieldUpdate::Set(_) => Ok(()),
    }
}
