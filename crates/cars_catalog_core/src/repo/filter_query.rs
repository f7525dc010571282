//! Filtered vehicle listing query.
//!
//! The statement text is fixed: every predicate is written once as
//! `(?n IS NULL OR ...)` and skipped by the engine when its bound value is
//! NULL. Only the bound values change between calls.
//!
//! # Invariants
//! - Text predicates use `instr`, which is case-sensitive and treats `%`/`_`
//!   in user input literally.
//! - Results are ordered by `reg_num ASC` so pages are deterministic.

use crate::model::filter::VehicleFilter;
use once_cell::sync::Lazy;
use rusqlite::types::Value;

/// Vehicle columns joined with owner columns.
pub const VEHICLE_SELECT_SQL: &str = "SELECT
    v.reg_num AS reg_num,
    v.mark AS mark,
    v.model AS model,
    v.year AS year,
    v.owner_id AS owner_id,
    o.name AS name,
    o.surname AS surname,
    o.patronymic AS patronymic
FROM vehicles v
INNER JOIN owners o ON o.id = v.owner_id";

/// Full listing statement with nine positional parameters.
pub static FILTERED_VEHICLES_SQL: Lazy<String> = Lazy::new(|| {
    format!(
        "{VEHICLE_SELECT_SQL}
        WHERE (?1 IS NULL OR instr(v.reg_num, ?1) > 0)
          AND (?2 IS NULL OR instr(v.mark, ?2) > 0)
          AND (?3 IS NULL OR instr(v.model, ?3) > 0)
          AND (?4 IS NULL OR v.year = ?4)
          AND (?5 IS NULL OR instr(o.name, ?5) > 0)
          AND (?6 IS NULL OR instr(o.surname, ?6) > 0)
          AND (?7 IS NULL OR instr(o.patronymic, ?7) > 0)
        ORDER BY v.reg_num ASC
        LIMIT ?8
        OFFSET ?9;"
    )
});

/// Bound values for [`FILTERED_VEHICLES_SQL`], in parameter order.
pub fn filter_params(filter: &VehicleFilter, offset: u32, limit: u32) -> [Value; 9] {
    [
        text_param(filter.reg_num.as_deref()),
        text_param(filter.mark.as_deref()),
        text_param(filter.model.as_deref()),
        match filter.year {
            Some(year) if year != 0 => Value::Integer(i64::from(year)),
            _ => Value::Null,
        },
        text_param(filter.name.as_deref()),
        text_param(filter.surname.as_deref()),
        text_param(filter.patronymic.as_deref()),
        Value::Integer(i64::from(limit)),
        Value::Integer(i64::from(offset)),
    ]
}

fn text_param(value: Option<&str>) -> Value {
    match value {
        Some(text) if !text.is_empty() => Value::Text(text.to_string()),
        _ => Value::Null,
    }
}
