//! External vehicle-info lookup contract.
//!
//! # Responsibility
//! - Define the seam to the registry that enriches a registration number
//!   into a full vehicle record.
//! - Provide an in-process snapshot adapter for imports and tests.

use crate::model::vehicle::Vehicle;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Lookup failure reported by the external registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// Registry rejected the registration number as malformed.
    BadRequest(String),
    /// Registry has no record for the registration number.
    NotFound(String),
    /// Registry could not be reached or answered unexpectedly.
    Unavailable { reg_num: String, message: String },
}

impl Display for LookupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(reg_num) => write!(f, "incorrect data for vehicle: {reg_num}"),
            Self::NotFound(reg_num) => write!(f, "cannot find vehicle: {reg_num}"),
            Self::Unavailable { reg_num, message } => {
                write!(f, "vehicle registry unavailable for {reg_num}: {message}")
            }
        }
    }
}

impl Error for LookupError {}

/// Source of vehicle details keyed by registration number.
pub trait VehicleInfoLookup {
    fn lookup(&self, reg_num: &str) -> Result<Vehicle, LookupError>;
}

/// Lookup backed by a fixed set of vehicle records.
#[derive(Debug, Clone, Default)]
pub struct SnapshotLookup {
    vehicles: BTreeMap<String, Vehicle>,
}

impl SnapshotLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later records replace earlier ones with the same registration number.
    pub fn from_vehicles(vehicles: impl IntoIterator<Item = Vehicle>) -> Self {
        let mut lookup = Self::new();
        for vehicle in vehicles {
            lookup.insert(vehicle);
        }
        lookup
    }

    pub fn insert(&mut self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.reg_num.clone(), vehicle);
    }

    /// Registration numbers in ascending order.
    pub fn reg_nums(&self) -> Vec<String> {
        self.vehicles.keys().cloned().collect()
    }
}

impl VehicleInfoLookup for SnapshotLookup {
    fn lookup(&self, reg_num: &str) -> Result<Vehicle, LookupError> {
        self.vehicles
            .get(reg_num)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(reg_num.to_string()))
    }
}

impl<L: VehicleInfoLookup + ?Sized> VehicleInfoLookup for &L {
    fn lookup(&self, reg_num: &str) -> Result<Vehicle, LookupError> {
        (**self).lookup(reg_num)
    }
}
