//! # Scope Filter
//!
//! Restricts a record set to one recruitment year and one organizational
//! viewing scope before anything is classified. Order is preserved.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::record::Recruit;
use crate::reference::ReferenceTables;

/// Organizational viewing boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum Scope {
    /// Whole country.
    #[default]
    Nation,
    /// One province.
    Province { province: String },
    /// One commune within a province.
    Commune { province: String, commune: String },
}

/// Who is looking. Only a national administrator has the sandbox hidden.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    #[default]
    Officer,
}

impl Scope {
    /// Scope for a province, or a commune within it when `commune` is given.
    #[must_use]
    pub fn from_parts(province: Option<&str>, commune: Option<&str>) -> Self {
        match (province, commune) {
            (Some(province), Some(commune)) => Scope::Commune {
                province: province.trim().to_string(),
                commune: commune.trim().to_string(),
            },
            (Some(province), None) => Scope::Province {
                province: province.trim().to_string(),
            },
            _ => Scope::Nation,
        }
    }

    /// Whether the commune dimension is already pinned.
    #[must_use]
    pub fn pins_commune(&self) -> bool {
        matches!(self, Scope::Commune { .. })
    }

    /// Whether `record` falls inside this scope (year not considered).
    #[must_use]
    pub fn contains(&self, record: &Recruit, role: Role, tables: &ReferenceTables) -> bool {
        let address = &record.address;
        match self {
            Scope::Nation => {
                !(role == Role::Administrator && tables.is_sandbox(&address.province))
            }
            Scope::Province { province } => address.province.trim() == province,
            Scope::Commune { province, commune } => {
                address.province.trim() == province && address.commune.trim() == commune
            }
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Nation => f.write_str("nation"),
            Scope::Province { province } => write!(f, "province {province}"),
            Scope::Commune { province, commune } => write!(f, "commune {commune}, {province}"),
        }
    }
}

/// Records of `year` inside `scope`, in input order.
pub fn filter_cohort<'a>(
    records: &'a [Recruit],
    year: i32,
    scope: &Scope,
    role: Role,
    tables: &ReferenceTables,
) -> Vec<&'a Recruit> {
    records
        .iter()
        .filter(|r| r.recruitment_year == year && scope.contains(r, role, tables))
        .collect()
}

/// Records of every year inside `scope`, in input order.
pub fn filter_all_years<'a>(
    records: &'a [Recruit],
    scope: &Scope,
    role: Role,
    tables: &ReferenceTables,
) -> Vec<&'a Recruit> {
    records
        .iter()
        .filter(|r| scope.contains(r, role, tables))
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Status;

    fn sample() -> Vec<Recruit> {
        vec![
            Recruit::new("1", 2024, Status::Source).with_address("Ha Noi", "Dong Anh", "Thon 1"),
            Recruit::new("2", 2024, Status::Source).with_address("Ha Noi", "Soc Son", "Thon 2"),
            Recruit::new("3", 2023, Status::Source).with_address("Ha Noi", "Dong Anh", "Thon 1"),
            Recruit::new("4", 2024, Status::Source).with_address("Sandbox", "X", "Y"),
            Recruit::new("5", 2024, Status::Source).with_address("Hue", "Phu Vang", "Thon 3"),
        ]
    }

    fn ids(records: &[&Recruit]) -> Vec<String> {
        records.iter().map(|r| r.id.to_string()).collect()
    }

    #[test]
    fn nation_scope_restricts_year_only_for_officers() {
        let records = sample();
        let tables = ReferenceTables::default().with_sandbox("Sandbox");
        let cohort = filter_cohort(&records, 2024, &Scope::Nation, Role::Officer, &tables);
        assert_eq!(ids(&cohort), vec!["1", "2", "4", "5"]);
    }

    #[test]
    fn national_admin_hides_sandbox() {
        let records = sample();
        let tables = ReferenceTables::default().with_sandbox("Sandbox");
        let cohort = filter_cohort(&records, 2024, &Scope::Nation, Role::Administrator, &tables);
        assert_eq!(ids(&cohort), vec!["1", "2", "5"]);
    }

    #[test]
    fn province_and_commune_scopes() {
        let records = sample();
        let tables = ReferenceTables::default();

        let province = Scope::from_parts(Some("Ha Noi"), None);
        let cohort = filter_cohort(&records, 2024, &province, Role::Officer, &tables);
        assert_eq!(ids(&cohort), vec!["1", "2"]);

        let commune = Scope::from_parts(Some("Ha Noi"), Some(" Dong Anh "));
        let cohort = filter_cohort(&records, 2024, &commune, Role::Officer, &tables);
        assert_eq!(ids(&cohort), vec!["1"]);
        assert!(commune.pins_commune());
    }

    #[test]
    fn commune_without_province_is_nation() {
        assert_eq!(Scope::from_parts(None, Some("Dong Anh")), Scope::Nation);
    }

    #[test]
    fn all_years_keeps_every_cohort() {
        let records = sample();
        let tables = ReferenceTables::default();
        let scope = Scope::from_parts(Some("Ha Noi"), Some("Dong Anh"));
        let all = filter_all_years(&records, &scope, Role::Officer, &tables);
        assert_eq!(ids(&all), vec!["1", "3"]);
    }
}
