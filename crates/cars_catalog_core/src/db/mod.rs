//! SQLite storage bootstrap, pooling and transaction scoping.
//!
//! # Responsibility
//! - Open pooled SQLite connections for the catalog core.
//! - Apply schema migrations in deterministic order.
//! - Scope multi-statement writes into one atomic unit of work.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Every pooled connection has `foreign_keys=ON` before first use.
//! - No transaction outlives the store operation that opened it.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
pub mod tx;

pub use open::{open_pool, open_pool_in_memory, DbPool, PooledConn};
pub use tx::run_in_transaction;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Connection could not be checked out of (or added to) the pool.
    Pool(r2d2::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Pool(err) => write!(f, "connection pool error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Pool(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<r2d2::Error> for DbError {
    fn from(value: r2d2::Error) -> Self {
        Self::Pool(value)
    }
}
