//! Vehicle catalog domain model.
//!
//! # Responsibility
//! - Define canonical vehicle/owner records, update inputs and filters.
//!
//! # Invariants
//! - Vehicles are identified by registration number.
//! - Owners are identified by the `(name, surname, patronymic)` triple.

pub mod filter;
pub mod patch;
pub mod vehicle;
