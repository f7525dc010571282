//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Write paths validate their input before acquiring a connection.
//! - Multi-statement writes run through [`crate::db::run_in_transaction`].
//! - Database failures surface unchanged inside [`RepoError::Db`].

use crate::db::DbError;
use crate::model::vehicle::VehicleValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod filter_query;
pub mod owner_repo;
pub mod vehicle_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for vehicle/owner persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Caller input rejected before any I/O.
    Validation(VehicleValidationError),
    Db(DbError),
    /// No vehicle stored under this registration number.
    NotFound(String),
    /// Pool handed over a database whose schema is not at the expected version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl RepoError {
    /// Returns `true` for caller-input faults.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(reg_num) => write!(f, "vehicle not found: {reg_num}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "vehicle repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<VehicleValidationError> for RepoError {
    fn from(value: VehicleValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<r2d2::Error> for RepoError {
    fn from(value: r2d2::Error) -> Self {
        Self::Db(DbError::Pool(value))
    }
}
