//! # Year Transfer
//!
//! Carries the unresolved part of one cohort into the next recruitment year.
//!
//! The source cohort is never touched: the plan holds new records tagged with
//! the target year, each pointing back at its origin through `source_id`.
//!
//! 1. Candidates are the NEXT_YEAR_SOURCE list of the source year
//!    (first-time registrations plus the remaining source).
//! 2. Candidates older than 27 at the *target* year drop out.
//! 3. TT50, deferred and exempted records keep their status; everything
//!    else restarts as SOURCE.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::MAX_AGE;
use crate::classify::{Classifier, ListId};
use crate::error::{EnlistError, Result};
use crate::record::{Recruit, RecruitId, Status, age};
use crate::reference::ReferenceTables;
use crate::scope::{Role, Scope};
use crate::store::RecordStore;

/// Statuses that survive the transfer unchanged.
const KEPT_STATUSES: [Status; 3] = [Status::NotSelectedTt50, Status::Deferred, Status::Exempted];

/// What the transfer did, for the confirmation prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferStats {
    /// First-time registrations that become SOURCE.
    pub first_time_to_source: usize,
    /// TT50 / deferred / exempted records carried with their status.
    pub kept_status: usize,
    /// Other source records reset to SOURCE.
    pub reset_to_source: usize,
    /// Candidates older than the age limit at the target year.
    pub excluded_over_age: usize,
    /// Candidates whose birth year is unknown.
    pub excluded_unknown_age: usize,
}

impl TransferStats {
    /// Number of records the plan will create.
    #[must_use]
    pub fn transferred(&self) -> usize {
        self.first_time_to_source
            .saturating_add(self.kept_status)
            .saturating_add(self.reset_to_source)
    }
}

/// A computed, not yet written, transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPlan {
    pub source_year: i32,
    pub target_year: i32,
    pub records: Vec<Recruit>,
    pub stats: TransferStats,
}

/// Status a carried record adopts in the new cycle.
#[must_use]
pub fn next_status(current: Status) -> Status {
    if KEPT_STATUSES.contains(&current) {
        current
    } else {
        Status::Source
    }
}

/// Id of the copy of `source` in `target_year`.
#[must_use]
pub fn carried_id(source: &RecruitId, target_year: i32) -> RecruitId {
    RecruitId(format!("{source}@{target_year}"))
}

fn carry(record: &Recruit, target_year: i32) -> Recruit {
    let status = next_status(record.status);
    let mut carried = record.clone();
    carried.id = carried_id(&record.id, target_year);
    carried.recruitment_year = target_year;
    carried.source_id = Some(record.id.clone());
    carried.status = status;
    // Enlistment type and deferment reason only mean something for the
    // statuses that carry them.
    if status == Status::Source {
        carried.enlistment_type = None;
        carried.deferment_reason = None;
    }
    carried
}

/// Compute the carryover from `source_year` to `target_year`.
///
/// Records of other years in `cohort` are ignored. Fails with
/// [`EnlistError::EmptyTransfer`] when nothing qualifies, so the caller can
/// warn before any write.
pub fn plan_transfer<'r, I>(
    cohort: I,
    source_year: i32,
    target_year: i32,
    tables: &ReferenceTables,
) -> Result<TransferPlan>
where
    I: IntoIterator<Item = &'r Recruit>,
{
    if target_year <= source_year {
        return Err(EnlistError::InvalidTransferYears {
            source_year,
            target_year,
        });
    }

    let classifier = Classifier::new(source_year, tables);
    let mut stats = TransferStats::default();
    let mut records = Vec::new();

    for record in cohort {
        if record.recruitment_year != source_year
            || !classifier.contains(ListId::NextYearSource, record)
        {
            continue;
        }

        match age(record, target_year) {
            None => {
                stats.excluded_unknown_age = stats.excluded_unknown_age.saturating_add(1);
                continue;
            }
            Some(a) if a > MAX_AGE => {
                stats.excluded_over_age = stats.excluded_over_age.saturating_add(1);
                continue;
            }
            Some(_) => {}
        }

        let counter = if record.status == Status::FirstTimeRegistration {
            &mut stats.first_time_to_source
        } else if KEPT_STATUSES.contains(&record.status) {
            &mut stats.kept_status
        } else {
            &mut stats.reset_to_source
        };
        *counter = counter.saturating_add(1);

        records.push(carry(record, target_year));
    }

    debug!(
        source_year,
        target_year,
        candidates = records.len(),
        over_age = stats.excluded_over_age,
        unknown_age = stats.excluded_unknown_age,
        "transfer planned"
    );

    if records.is_empty() {
        return Err(EnlistError::EmptyTransfer {
            source_year,
            target_year,
        });
    }

    Ok(TransferPlan {
        source_year,
        target_year,
        records,
        stats,
    })
}

/// Write a plan through `store` in one bulk create.
///
/// Refuses when the target year already has records inside `scope`, so
/// running the same transfer twice cannot duplicate the cohort. Returns the
/// number of records written.
pub fn execute_transfer<S: RecordStore + ?Sized>(
    plan: TransferPlan,
    store: &mut S,
    scope: &Scope,
    role: Role,
    tables: &ReferenceTables,
) -> Result<usize> {
    let existing = store.count_cohort(plan.target_year, scope, role, tables)?;
    if existing > 0 {
        return Err(EnlistError::TargetCohortNotEmpty {
            year: plan.target_year,
            count: existing,
        });
    }

    let written = plan.records.len();
    store.bulk_create(plan.records)?;
    info!(
        source_year = plan.source_year,
        target_year = plan.target_year,
        written,
        "transfer written"
    );
    Ok(written)
}

// =============================================================================
// TESTS
// =============================================================================
