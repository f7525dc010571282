//! Vehicle repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide bulk add, partial update, delete and filtered listing over
//!   `vehicles` joined with `owners`.
//! - Keep SQL details inside core persistence boundary.
//!
//! # Invariants
//! - Bulk add is all-or-nothing; existing registration numbers are skipped.
//! - Partial update only writes supplied fields (blank text and year `0` are
//!   not supplied) and commits owner resolution and the row update together.
//! - Year `0` on add is stored as unknown (NULL).
//! - Deleting a missing registration number succeeds.
//! - The repository holds no mutable state; it is safe to share across threads.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{run_in_transaction, DbPool};
use crate::model::filter::VehicleFilter;
use crate::model::patch::{FieldUpdate, OwnerChange, VehiclePatch};
use crate::model::vehicle::{validate_reg_num, Owner, Vehicle, VehicleRecord};
use crate::repo::filter_query::{filter_params, FILTERED_VEHICLES_SQL, VEHICLE_SELECT_SQL};
use crate::repo::owner_repo::resolve_owner;
use crate::repo::{RepoError, RepoResult};
use log::{debug, error, info};
use rusqlite::{params, params_from_iter, Row};
use std::time::Instant;

const INSERT_VEHICLE_SQL: &str = "INSERT INTO vehicles (reg_num, mark, model, year, owner_id)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT (reg_num) DO NOTHING;";

const UPDATE_VEHICLE_SQL: &str = "UPDATE vehicles
    SET
        mark = COALESCE(?2, mark),
        model = COALESCE(?3, model),
        year = CASE WHEN ?4 THEN ?5 ELSE year END,
        owner_id = COALESCE(?6, owner_id)
    WHERE reg_num = ?1;";

const DELETE_VEHICLE_SQL: &str = "DELETE FROM vehicles WHERE reg_num = ?1;";

/// Repository interface for the vehicle catalog.
pub trait VehicleRepository {
    /// Inserts vehicles in input order, resolving owners on the way.
    ///
    /// Returns the number of newly inserted rows.
    fn add(&self, vehicles: &[Vehicle]) -> RepoResult<usize>;
    /// Applies a partial update by registration number.
    fn update(&self, patch: &VehiclePatch) -> RepoResult<()>;
    /// Deletes one vehicle. Returns whether a row was removed.
    fn delete(&self, reg_num: &str) -> RepoResult<bool>;
    /// Gets one vehicle with its owner.
    fn get(&self, reg_num: &str) -> RepoResult<Option<VehicleRecord>>;
    /// Lists vehicles matching `filter`, ordered by registration number.
    fn get_all(
        &self,
        filter: &VehicleFilter,
        offset: u32,
        limit: u32,
    ) -> RepoResult<Vec<VehicleRecord>>;
}

/// SQLite-backed vehicle repository over a shared connection pool.
#[derive(Clone)]
pub struct SqliteVehicleRepository {
    pool: DbPool,
}

impl SqliteVehicleRepository {
    /// Constructs a repository from a migrated pool.
    pub fn try_new(pool: DbPool) -> RepoResult<Self> {
        let conn = pool.get()?;
        let actual_version = current_user_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        drop(conn);
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl VehicleRepository for SqliteVehicleRepository {
    fn add(&self, vehicles: &[Vehicle]) -> RepoResult<usize> {
        for vehicle in vehicles {
            vehicle.validate()?;
        }
        if vehicles.is_empty() {
            return Ok(0);
        }

        let started_at = Instant::now();
        let mut conn = self.pool.get()?;
        let result: RepoResult<usize> = run_in_transaction(&mut conn, "vehicle_add", |tx| {
            let mut inserted = 0;
            for vehicle in vehicles {
                let owner_id = resolve_owner(tx, &vehicle.owner)?;
                let changed = tx.execute(
                    INSERT_VEHICLE_SQL,
                    params![
                        vehicle.reg_num,
                        vehicle.mark,
                        vehicle.model,
                        vehicle.known_year(),
                        owner_id,
                    ],
                )?;
                if changed == 0 {
                    debug!(
                        "event=vehicle_add module=repo status=skipped reason=exists reg_num={}",
                        vehicle.reg_num
                    );
                }
                inserted += changed;
            }
            Ok(inserted)
        });

        match &result {
            Ok(inserted) => info!(
                "event=vehicle_add module=repo status=ok requested={} inserted={} duration_ms={}",
                vehicles.len(),
                inserted,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event=vehicle_add module=repo status=error requested={} duration_ms={} error={}",
                vehicles.len(),
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn update(&self, patch: &VehiclePatch) -> RepoResult<()> {
        let owner_change = patch.validate()?;
        let patch = &patch.normalized();
        let (write_year, year) = match patch.year {
            FieldUpdate::Keep => (false, None),
            FieldUpdate::Clear => (true, None),
            FieldUpdate::Set(year) => (true, Some(year)),
        };

        let mut conn = self.pool.get()?;
        let result: RepoResult<()> = run_in_transaction(&mut conn, "vehicle_update", |tx| {
            let owner_id = match &owner_change {
                OwnerChange::Unchanged => None,
                OwnerChange::Reassign(owner) => Some(resolve_owner(tx, owner)?),
            };

            let changed = tx.execute(
                UPDATE_VEHICLE_SQL,
                params![
                    patch.reg_num,
                    patch.mark.as_set(),
                    patch.model.as_set(),
                    write_year,
                    year,
                    owner_id,
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(patch.reg_num.clone()));
            }
            Ok(())
        });

        match &result {
            Ok(()) => debug!(
                "event=vehicle_update module=repo status=ok reg_num={} owner_reassigned={}",
                patch.reg_num,
                matches!(owner_change, OwnerChange::Reassign(_))
            ),
            Err(RepoError::NotFound(_)) => debug!(
                "event=vehicle_update module=repo status=not_found reg_num={}",
                patch.reg_num
            ),
            Err(err) => error!(
                "event=vehicle_update module=repo status=error reg_num={} error={}",
                patch.reg_num, err
            ),
        }
        result
    }

    fn delete(&self, reg_num: &str) -> RepoResult<bool> {
        validate_reg_num(reg_num)?;

        let conn = self.pool.get()?;
        let changed = conn.execute(DELETE_VEHICLE_SQL, [reg_num])?;
        debug!(
            "event=vehicle_delete module=repo status=ok reg_num={} removed={}",
            reg_num,
            changed > 0
        );
        Ok(changed > 0)
    }

    fn get(&self, reg_num: &str) -> RepoResult<Option<VehicleRecord>> {
        validate_reg_num(reg_num)?;

        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("{VEHICLE_SELECT_SQL} WHERE v.reg_num = ?1;"))?;
        let mut rows = stmt.query([reg_num])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_vehicle_row(row)?));
        }

        Ok(None)
    }

    fn get_all(
        &self,
        filter: &VehicleFilter,
        offset: u32,
        limit: u32,
    ) -> RepoResult<Vec<VehicleRecord>> {
        let started_at = Instant::now();
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare_cached(FILTERED_VEHICLES_SQL.as_str())?;
        let mut rows = stmt.query(params_from_iter(filter_params(filter, offset, limit)))?;
        let mut vehicles = Vec::new();
        while let Some(row) = rows.next()? {
            vehicles.push(parse_vehicle_row(row)?);
        }

        debug!(
            "event=vehicle_list module=repo status=ok filtered={} offset={} limit={} returned={} duration_ms={}",
            !filter.is_empty(),
            offset,
            limit,
            vehicles.len(),
            started_at.elapsed().as_millis()
        );
        Ok(vehicles)
    }
}

fn parse_vehicle_row(row: &Row<'_>) -> RepoResult<VehicleRecord> {
    Ok(VehicleRecord {
        reg_num: row.get("reg_num")?,
        mark: row.get("mark")?,
        model: row.get("model")?,
        year: row.get("year")?,
        owner_id: row.get("owner_id")?,
        owner: Owner {
            name: row.get("name")?,
            surname: row.get("surname")?,
            patronymic: row.get("patronymic")?,
        },
    })
}
