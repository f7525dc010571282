//! Core persistence and use-case logic for the vehicle catalog.
//! This crate is the single source of truth for catalog invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{CatalogConfig, ConfigError, PoolConfig};
pub use db::{open_pool, open_pool_in_memory, DbError, DbPool};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::filter::VehicleFilter;
pub use model::patch::{FieldUpdate, OwnerChange, VehiclePatch};
pub use model::vehicle::{
    Owner, OwnerId, Vehicle, VehicleRecord, VehicleValidationError, FIRST_CAR_YEAR,
};
pub use repo::vehicle_repo::{SqliteVehicleRepository, VehicleRepository};
pub use repo::{RepoError, RepoResult};
pub use service::lookup::{LookupError, SnapshotLookup, VehicleInfoLookup};
pub use service::vehicle_service::{FaultClass, ServiceError, VehicleList, VehicleService};

/// Minimal health-check API for wiring probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
