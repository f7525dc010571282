//! Vehicle catalog use-case service.
//!
//! # Responsibility
//! - Enrich registration numbers through [`VehicleInfoLookup`] and ingest
//!   them in one batch.
//! - Normalize listing windows and validate filters.
//! - Classify failures for the transport boundary.
//!
//! # Invariants
//! - A lookup or validation failure aborts ingestion before the store is
//!   touched.
//! - Listing limit is always within `LIST_LIMIT_MIN..=LIST_LIMIT_MAX`.

use crate::model::filter::VehicleFilter;
use crate::model::patch::VehiclePatch;
use crate::model::vehicle::{validate_year, Vehicle, VehicleRecord, VehicleValidationError};
use crate::repo::vehicle_repo::VehicleRepository;
use crate::repo::RepoError;
use crate::service::lookup::{LookupError, VehicleInfoLookup};
use log::{debug, error, info};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const LIST_LIMIT_MIN: u32 = 5;
pub const LIST_LIMIT_MAX: u32 = 100;

/// Response class a transport adapter should map a failure to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultClass {
    /// Caller sent unusable input.
    CallerInput,
    /// Referenced vehicle does not exist.
    NotFound,
    /// Anything else; details stay in logs.
    Internal,
}

/// Service error for vehicle use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Input rejected before any I/O.
    Validation(VehicleValidationError),
    /// Ingestion request carried no registration numbers.
    EmptyBatch,
    /// External registry failed for one registration number.
    Lookup(LookupError),
    /// Target vehicle does not exist.
    NotFound(String),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Write succeeded but read-back disagrees.
    InconsistentState(&'static str),
}

impl ServiceError {
    pub fn fault(&self) -> FaultClass {
        match self {
            Self::Validation(_) | Self::EmptyBatch => FaultClass::CallerInput,
            Self::Lookup(LookupError::BadRequest(_)) => FaultClass::CallerInput,
            Self::Lookup(LookupError::NotFound(_)) | Self::NotFound(_) => FaultClass::NotFound,
            Self::Lookup(LookupError::Unavailable { .. })
            | Self::Repo(_)
            | Self::InconsistentState(_) => FaultClass::Internal,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::EmptyBatch => write!(f, "no registration numbers supplied"),
            Self::Lookup(err) => write!(f, "{err}"),
            Self::NotFound(reg_num) => write!(f, "vehicle not found: {reg_num}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent vehicle state: {details}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Lookup(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(reg_num) => Self::NotFound(reg_num),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<VehicleValidationError> for ServiceError {
    fn from(value: VehicleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<LookupError> for ServiceError {
    fn from(value: LookupError) -> Self {
        Self::Lookup(value)
    }
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleList {
    /// Items sorted by registration number ascending.
    pub items: Vec<VehicleRecord>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Vehicle service facade over a repository and a lookup client.
pub struct VehicleService<R: VehicleRepository, L: VehicleInfoLookup> {
    repo: R,
    lookup: L,
}

impl<R: VehicleRepository, L: VehicleInfoLookup> VehicleService<R, L> {
    pub fn new(repo: R, lookup: L) -> Self {
        Self { repo, lookup }
    }

    /// Looks up every registration number and stores the results in one batch.
    ///
    /// Duplicate entries are looked up once. Returns the number of newly
    /// stored vehicles.
    pub fn add_all(&self, reg_nums: &[String]) -> Result<usize, ServiceError> {
        let mut seen = HashSet::new();
        let mut vehicles = Vec::with_capacity(reg_nums.len());
        for raw in reg_nums {
            let reg_num = raw.trim();
            if reg_num.is_empty() {
                return Err(VehicleValidationError::EmptyRegNum.into());
            }
            if !seen.insert(reg_num.to_string()) {
                continue;
            }

            let vehicle = match self.lookup.lookup(reg_num) {
                Ok(vehicle) => normalize_looked_up(reg_num, vehicle),
                Err(err) => {
                    error!(
                        "event=vehicle_lookup module=service status=error reg_num={} error={}",
                        reg_num, err
                    );
                    return Err(err.into());
                }
            };
            if let Err(err) = vehicle.validate() {
                debug!(
                    "event=vehicle_lookup module=service status=invalid reg_num={} error={}",
                    reg_num, err
                );
                return Err(err.into());
            }
            vehicles.push(vehicle);
        }

        if vehicles.is_empty() {
            return Err(ServiceError::EmptyBatch);
        }

        let inserted = self.repo.add(&vehicles)?;
        info!(
            "event=vehicle_ingest module=service status=ok looked_up={} inserted={}",
            vehicles.len(),
            inserted
        );
        Ok(inserted)
    }

    /// Applies a partial update and returns the stored result.
    pub fn update(&self, patch: &VehiclePatch) -> Result<VehicleRecord, ServiceError> {
        self.repo.update(patch)?;
        self.repo
            .get(&patch.reg_num)?
            .ok_or(ServiceError::InconsistentState(
                "updated vehicle not found in read-back",
            ))
    }

    /// Deletes one vehicle. Missing vehicles are not an error.
    pub fn delete(&self, reg_num: &str) -> Result<bool, ServiceError> {
        Ok(self.repo.delete(reg_num.trim())?)
    }

    pub fn get(&self, reg_num: &str) -> Result<Option<VehicleRecord>, ServiceError> {
        Ok(self.repo.get(reg_num.trim())?)
    }

    /// Lists vehicles with a validated filter and a normalized window.
    pub fn list(
        &self,
        filter: &VehicleFilter,
        offset: u32,
        limit: Option<u32>,
    ) -> Result<VehicleList, ServiceError> {
        if let Some(year) = filter.year.filter(|year| *year != 0) {
            validate_year(year)?;
        }
        let applied_limit = normalize_list_limit(limit);
        let items = self.repo.get_all(filter, offset, applied_limit)?;
        Ok(VehicleList {
            items,
            applied_limit,
        })
    }
}

/// Clamps a requested page size into `LIST_LIMIT_MIN..=LIST_LIMIT_MAX`.
///
/// Absent or zero limits use the minimum.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    limit
        .unwrap_or(LIST_LIMIT_MIN)
        .clamp(LIST_LIMIT_MIN, LIST_LIMIT_MAX)
}

/// Cleans registry output: blank patronymic means none, year `0` means unknown.
fn normalize_looked_up(requested: &str, mut vehicle: Vehicle) -> Vehicle {
    if vehicle.reg_num.trim().is_empty() {
        vehicle.reg_num = requested.to_string();
    }
    if vehicle
        .owner
        .patronymic
        .as_deref()
        .is_some_and(|value| value.trim().is_empty())
    {
        vehicle.owner.patronymic = None;
    }
    vehicle.year = vehicle.known_year();
    vehicle
}
