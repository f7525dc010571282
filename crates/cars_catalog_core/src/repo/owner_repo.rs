//! Owner identity resolution.
//!
//! # Responsibility
//! - Map an owner triple to a stable `owners.id`, creating the row on first use.
//!
//! # Invariants
//! - Match is exact on name and surname; patronymic matches only when both
//!   sides are absent, or both present and equal (`IS` comparison).
//! - Owner rows are never updated or deleted here.
//! - Callers run resolution inside an open transaction. Combined with the
//!   unique identity index, concurrent writers cannot create duplicates.

use crate::model::vehicle::{Owner, OwnerId};
use crate::repo::RepoResult;
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

const SELECT_OWNER_ID_SQL: &str = "SELECT id
    FROM owners
    WHERE name = ?1
      AND surname = ?2
      AND patronymic IS ?3;";

const INSERT_OWNER_SQL: &str = "INSERT INTO owners (name, surname, patronymic)
    VALUES (?1, ?2, ?3)
    ON CONFLICT DO NOTHING
    RETURNING id;";

/// Looks up an owner by identity without creating it.
pub fn find_owner(conn: &Connection, owner: &Owner) -> RepoResult<Option<OwnerId>> {
    let id = conn
        .query_row(
            SELECT_OWNER_ID_SQL,
            params![owner.name, owner.surname, owner.patronymic],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Finds the owner with this identity or inserts it, returning its id.
///
/// Expected to run on a [`rusqlite::Transaction`] opened by the caller.
pub fn resolve_owner(conn: &Connection, owner: &Owner) -> RepoResult<OwnerId> {
    debug_assert!(
        !conn.is_autocommit(),
        "owner resolution must run inside a transaction"
    );

    if let Some(id) = find_owner(conn, owner)? {
        debug!("event=owner_resolve module=repo status=ok outcome=existing owner_id={id}");
        return Ok(id);
    }

    let inserted: Option<OwnerId> = conn
        .query_row(
            INSERT_OWNER_SQL,
            params![owner.name, owner.surname, owner.patronymic],
            |row| row.get(0),
        )
        .optional()?;

    let id = match inserted {
        Some(id) => id,
        // Another writer committed the same identity between select and insert.
        None => conn.query_row(
            SELECT_OWNER_ID_SQL,
            params![owner.name, owner.surname, owner.patronymic],
            |row| row.get(0),
        )?,
    };
    debug!("event=owner_resolve module=repo status=ok outcome=created owner_id={id}");
    Ok(id)
}
