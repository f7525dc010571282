//! Pool bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Build file or in-memory connection pools.
//! - Configure per-connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable pool.
//!
//! # Invariants
//! - Pooled connections have `foreign_keys=ON` and a busy timeout.
//! - Returned pools have migrations fully applied.

use super::migrations::apply_migrations;
use super::DbResult;
use crate::config::PoolConfig;
use log::{error, info};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Shared connection pool handed to repositories.
pub type DbPool = Pool<SqliteConnectionManager>;
/// One connection checked out of [`DbPool`]; returns to the pool on drop.
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Opens a pooled SQLite database file and applies all pending migrations.
///
/// # Side effects
/// - Creates the database file when missing.
/// - Switches the file to WAL journal mode.
/// - Emits `db_open` logging events with duration and status.
pub fn open_pool(path: impl AsRef<Path>, config: &PoolConfig) -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!(
        "event=db_open module=db status=start mode=file max_connections={}",
        config.max_connections
    );

    let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
    let manager = SqliteConnectionManager::file(path.as_ref())
        .with_init(move |conn| init_connection(conn, busy_timeout));
    let built = Pool::builder()
        .max_size(config.max_connections.max(1))
        .min_idle(Some(config.min_idle.min(config.max_connections)))
        .connection_timeout(Duration::from_millis(config.connection_timeout_ms))
        .build(manager);

    finish_open(built, true, "file", started_at)
}

/// Opens a private in-memory database behind a single-connection pool.
///
/// Each SQLite in-memory connection is its own database, so the pool holds
/// exactly one connection that is never reaped or recycled; a replacement
/// would start empty and unmigrated.
pub fn open_pool_in_memory() -> DbResult<DbPool> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let busy_timeout = Duration::from_millis(PoolConfig::default().busy_timeout_ms);
    let manager = SqliteConnectionManager::memory()
        .with_init(move |conn| init_connection(conn, busy_timeout));
    let built = Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .build(manager);

    finish_open(built, false, "memory", started_at)
}

fn finish_open(
    built: Result<DbPool, r2d2::Error>,
    enable_wal: bool,
    mode: &'static str,
    started_at: Instant,
) -> DbResult<DbPool> {
    let pool = match built {
        Ok(pool) => pool,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_pool_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap_schema(&pool, enable_wal) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(pool)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn init_connection(conn: &mut Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)
}

fn bootstrap_schema(pool: &DbPool, enable_wal: bool) -> DbResult<()> {
    let mut conn = pool.get()?;
    if enable_wal {
        // journal_mode answers with a row, so it cannot go through execute_batch.
        conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
    }
    apply_migrations(&mut conn)?;
    Ok(())
}
