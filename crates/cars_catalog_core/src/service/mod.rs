//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate lookup and repository calls into use-case level APIs.
//! - Keep transport adapters decoupled from storage details.

pub mod lookup;
pub mod vehicle_service;
