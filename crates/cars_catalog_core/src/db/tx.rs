//! Scoped unit-of-work helper for multi-statement writes.
//!
//! # Invariants
//! - Work runs inside one `BEGIN IMMEDIATE` transaction, so the SQLite write
//!   lock is held from the first statement.
//! - `Ok` commits, `Err` rolls back. A failed rollback is logged and never
//!   replaces the error returned by the work closure.

use log::{debug, error};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::fmt::Display;

/// Runs `work` in an immediate transaction on `conn`.
///
/// `operation` only labels log events.
///
/// # Errors
/// - Begin and commit failures are converted through `E: From<rusqlite::Error>`.
/// - Errors from `work` are returned unchanged after rollback.
pub fn run_in_transaction<T, E, F>(
    conn: &mut Connection,
    operation: &'static str,
    work: F,
) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error> + Display,
{
    let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
        Ok(tx) => tx,
        Err(err) => {
            error!(
                "event=tx_begin module=db status=error operation={} error={}",
                operation, err
            );
            return Err(err.into());
        }
    };

    match work(&tx) {
        Ok(value) => match tx.commit() {
            Ok(()) => {
                debug!("event=tx_commit module=db status=ok operation={operation}");
                Ok(value)
            }
            Err(err) => {
                error!(
                    "event=tx_commit module=db status=error operation={} error={}",
                    operation, err
                );
                Err(err.into())
            }
        },
        Err(err) => {
            debug!(
                "event=tx_rollback module=db status=start operation={} cause={}",
                operation, err
            );
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event=tx_rollback module=db status=error operation={} error={}",
                    operation, rollback_err
                );
            }
            Err(err)
        }
    }
}
