//! Vehicle search filter.
//!
//! # Invariants
//! - Every predicate is optional; an empty filter matches all vehicles.
//! - Text predicates are case-sensitive substring matches; `year` is exact.
//! - Empty strings and year `0` impose no constraint.

use serde::{Deserialize, Serialize};

/// Optional predicates applied by vehicle listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleFilter {
    pub reg_num: Option<String>,
    pub mark: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub patronymic: Option<String>,
}

impl VehicleFilter {
    /// Returns `true` when no predicate would constrain the result.
    pub fn is_empty(&self) -> bool {
        [
            &self.reg_num,
            &self.mark,
            &self.model,
            &self.name,
            &self.surname,
            &self.patronymic,
        ]
        .iter()
        .all(|value| value.as_deref().map_or(true, str::is_empty))
            && self.year.map_or(true, |year| year == 0)
    }
}
