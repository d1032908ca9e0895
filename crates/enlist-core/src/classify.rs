//! # Classifier
//!
//! Named worklists as independent boolean predicates over a record and a
//! reference year.
//!
//! The lists overlap on purpose (a finalized record is also med-exam-passed
//! and pre-check-passed), so nothing here assumes a partition. Each rule is
//! written once; derived lists call the layer below them:
//!
//! ```text
//! age + status ──► TOTAL_SOURCE ──► PRE_CHECK
//!                       │
//!                       └─────────► REMAINING ──► NEXT_YEAR_SOURCE
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::MIN_AGE;
use crate::error::EnlistError;
use crate::record::{EnlistmentType, Recruit, Status, age};
use crate::reference::{DefermentCategory, ReferenceTables};

// =============================================================================
// STATUS SETS
// =============================================================================

/// Statuses that never count toward the source, whatever the age.
pub const REGISTRATION_EXCLUDED: [Status; 4] = [
    Status::NotAllowedRegistration,
    Status::ExemptRegistration,
    Status::FirstTimeRegistration,
    Status::Deleted,
];

/// Source statuses that are not called up for the pre-check.
const PRE_CHECK_EXCLUDED: [Status; 5] = [
    Status::NotSelectedTt50,
    Status::Deferred,
    Status::Exempted,
    Status::RemovedFromSource,
    Status::Deleted,
];

/// Everything at or past a passed pre-check. A failed medical exam still
/// passed the pre-check.
const PRE_CHECK_PASSED: [Status; 5] = [
    Status::PreCheckPassed,
    Status::MedExamPassed,
    Status::MedExamFailed,
    Status::Finalized,
    Status::Enlisted,
];

const MED_EXAM_PASSED: [Status; 3] = [Status::MedExamPassed, Status::Finalized, Status::Enlisted];

const FINALIZED: [Status; 2] = [Status::Finalized, Status::Enlisted];

// =============================================================================
// LIST IDENTIFIERS
// =============================================================================

/// Every named worklist, including the deferred and finalized sub-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListId {
    NotAllowed,
    ExemptRegistration,
    FirstTime,
    TotalSource,
    Tt50,
    PreCheck,
    PreCheckPass,
    PreCheckFail,
    MedExam,
    MedExamPass,
    MedExamFail,
    Deferred,
    DeferredHealth,
    DeferredEducation,
    DeferredPolicy,
    DeferredMilitia,
    DeferredOther,
    Exempted,
    Finalized,
    FinalizedOfficial,
    FinalizedReserve,
    Enlisted,
    Removed,
    Remaining,
    NextYearSource,
    Deleted,
}

impl ListId {
    /// Every list, in dashboard order.
    pub const ALL: [ListId; 26] = [
        ListId::NotAllowed,
        ListId::ExemptRegistration,
        ListId::FirstTime,
        ListId::TotalSource,
        ListId::Tt50,
        ListId::PreCheck,
        ListId::PreCheckPass,
        ListId::PreCheckFail,
        ListId::MedExam,
        ListId::MedExamPass,
        ListId::MedExamFail,
        ListId::Deferred,
        ListId::DeferredHealth,
        ListId::DeferredEducation,
        ListId::DeferredPolicy,
        ListId::DeferredMilitia,
        ListId::DeferredOther,
        ListId::Exempted,
        ListId::Finalized,
        ListId::FinalizedOfficial,
        ListId::FinalizedReserve,
        ListId::Enlisted,
        ListId::Removed,
        ListId::Remaining,
        ListId::NextYearSource,
        ListId::Deleted,
    ];

    /// Kebab-case name, as accepted by [`FromStr`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ListId::NotAllowed => "not-allowed",
            ListId::ExemptRegistration => "exempt-registration",
            ListId::FirstTime => "first-time",
            ListId::TotalSource => "total-source",
            ListId::Tt50 => "tt50",
            ListId::PreCheck => "pre-check",
            ListId::PreCheckPass => "pre-check-pass",
            ListId::PreCheckFail => "pre-check-fail",
            ListId::MedExam => "med-exam",
            ListId::MedExamPass => "med-exam-pass",
            ListId::MedExamFail => "med-exam-fail",
            ListId::Deferred => "deferred",
            ListId::DeferredHealth => "deferred-health",
            ListId::DeferredEducation => "deferred-education",
            ListId::DeferredPolicy => "deferred-policy",
            ListId::DeferredMilitia => "deferred-militia",
            ListId::DeferredOther => "deferred-other",
            ListId::Exempted => "exempted",
            ListId::Finalized => "finalized",
            ListId::FinalizedOfficial => "finalized-official",
            ListId::FinalizedReserve => "finalized-reserve",
            ListId::Enlisted => "enlisted",
            ListId::Removed => "removed",
            ListId::Remaining => "remaining",
            ListId::NextYearSource => "next-year-source",
            ListId::Deleted => "deleted",
        }
    }

    /// Short roster code used on printed forms, where one exists.
    #[must_use]
    pub fn code(self) -> Option<&'static str> {
        match self {
            ListId::TotalSource => Some("DS4"),
            ListId::PreCheck => Some("DS6"),
            ListId::Remaining => Some("DS13"),
            ListId::NextYearSource => Some("DS14"),
            _ => None,
        }
    }

    /// Deferred sub-list for a category.
    #[must_use]
    pub fn deferred(category: DefermentCategory) -> Self {
        match category {
            DefermentCategory::Health => ListId::DeferredHealth,
            DefermentCategory::Education => ListId::DeferredEducation,
            DefermentCategory::Policy => ListId::DeferredPolicy,
            DefermentCategory::Militia => ListId::DeferredMilitia,
            DefermentCategory::Other => ListId::DeferredOther,
        }
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ListId {
    type Err = EnlistError;

    /// Accepts the kebab-case name (`_` also allowed) or the short code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        ListId::ALL
            .into_iter()
            .find(|list| {
                list.name() == wanted
                    || list
                        .code()
                        .is_some_and(|code| code.eq_ignore_ascii_case(&wanted))
            })
            .ok_or_else(|| EnlistError::UnknownList(s.to_string()))
    }
}

// =============================================================================
// CLASSIFIER
// =============================================================================

/// Evaluates list membership for one reference year.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'a> {
    reference_year: i32,
    tables: &'a ReferenceTables,
}

impl<'a> Classifier<'a> {
    /// Create a classifier for `reference_year`.
    #[must_use]
    pub fn new(reference_year: i32, tables: &'a ReferenceTables) -> Self {
        Self {
            reference_year,
            tables,
        }
    }

    /// The year ages are computed against.
    #[must_use]
    pub fn reference_year(&self) -> i32 {
        self.reference_year
    }

    /// Age ≥ 18 at the reference year. Unknown age fails.
    fn is_of_age(&self, record: &Recruit) -> bool {
        age(record, self.reference_year).is_some_and(|a| a >= MIN_AGE)
    }

    /// Does `record` belong to `list`?
    #[must_use]
    pub fn contains(&self, list: ListId, record: &Recruit) -> bool {
        let status = record.status;
        match list {
            ListId::NotAllowed => status == Status::NotAllowedRegistration,
            ListId::ExemptRegistration => status == Status::ExemptRegistration,
            ListId::FirstTime => status == Status::FirstTimeRegistration,
            ListId::TotalSource => {
                self.is_of_age(record) && !REGISTRATION_EXCLUDED.contains(&status)
            }
            ListId::Tt50 => status == Status::NotSelectedTt50,
            ListId::PreCheck => {
                self.contains(ListId::TotalSource, record)
                    && !PRE_CHECK_EXCLUDED.contains(&status)
            }
            ListId::PreCheckPass | ListId::MedExam => PRE_CHECK_PASSED.contains(&status),
            ListId::PreCheckFail => status == Status::PreCheckFailed,
            ListId::MedExamPass => MED_EXAM_PASSED.contains(&status),
            ListId::MedExamFail => status == Status::MedExamFailed,
            ListId::Deferred => status == Status::Deferred,
            ListId::DeferredHealth
            | ListId::DeferredEducation
            | ListId::DeferredPolicy
            | ListId::DeferredMilitia
            | ListId::DeferredOther => {
                status == Status::Deferred
                    && ListId::deferred(
                        self.tables
                            .deferment_category(record.deferment_reason.as_deref()),
                    ) == list
            }
            ListId::Exempted => status == Status::Exempted,
            ListId::Finalized => FINALIZED.contains(&status),
            ListId::FinalizedOfficial => {
                FINALIZED.contains(&status)
                    && record.enlistment_type == Some(EnlistmentType::Official)
            }
            // A missing type is not departed, so it counts as reserve.
            ListId::FinalizedReserve => {
                FINALIZED.contains(&status)
                    && record.enlistment_type != Some(EnlistmentType::Official)
            }
            ListId::Enlisted => {
                status == Status::Enlisted
                    && record.enlistment_type == Some(EnlistmentType::Official)
            }
            ListId::Removed => status == Status::RemovedFromSource,
            ListId::Remaining => {
                self.contains(ListId::TotalSource, record)
                    && status != Status::RemovedFromSource
                    && !record.is_departed()
            }
            // NOT_ALLOWED and EXEMPT_REG fail TOTAL_SOURCE, hence REMAINING,
            // so they can never reach this list.
            ListId::NextYearSource => {
                status == Status::FirstTimeRegistration
                    || self.contains(ListId::Remaining, record)
            }
            ListId::Deleted => status == Status::Deleted,
        }
    }

    /// Every list `record` belongs to, in [`ListId::ALL`] order.
    #[must_use]
    pub fn memberships(&self, record: &Recruit) -> Vec<ListId> {
        ListId::ALL
            .into_iter()
            .filter(|list| self.contains(*list, record))
            .collect()
    }

    /// Members of `list`, in input order.
    pub fn select<'r, I>(&self, list: ListId, cohort: I) -> Vec<&'r Recruit>
    where
        I: IntoIterator<Item = &'r Recruit>,
    {
        cohort
            .into_iter()
            .filter(|record| self.contains(list, record))
            .collect()
    }

    /// Size of every list. Each list is counted independently.
    pub fn counts<'r, I>(&self, cohort: I) -> BTreeMap<ListId, usize>
    where
        I: IntoIterator<Item = &'r Recruit>,
    {
        let mut counts: BTreeMap<ListId, usize> =
            ListId::ALL.into_iter().map(|list| (list, 0)).collect();
        for record in cohort {
            for list in self.memberships(record) {
                if let Some(count) = counts.get_mut(&list) {
                    *count = count.saturating_add(1);
                }
            }
        }
        counts
    }
}

/// Members of `list` in `cohort` for `reference_year`, in input order.
pub fn classify<'r, I>(
    cohort: I,
    list: ListId,
    reference_year: i32,
    tables: &ReferenceTables,
) -> Vec<&'r Recruit>
where
    I: IntoIterator<Item = &'r Recruit>,
{
    Classifier::new(reference_year, tables).select(list, cohort)
}

// =============================================================================
// EXPIRY TRACKING
// =============================================================================

/// End year of a period string such as `"2021-2025"`, `"2021 - 2025"` or `"2025"`.
#[must_use]
pub fn period_end_year(period: &str) -> Option<i32> {
    period
        .split(|c: char| !c.is_ascii_digit())
        .filter(|token| token.len() == 4)
        .last()
        .and_then(|token| token.parse().ok())
}

/// Deferred records whose study or sentence period ends in `year`.
///
/// These are the deferments that lapse during the cycle and need review.
pub fn expiring<'r, I>(cohort: I, year: i32) -> Vec<&'r Recruit>
where
    I: IntoIterator<Item = &'r Recruit>,
{
    cohort
        .into_iter()
        .filter(|record| record.status == Status::Deferred)
        .filter(|record| {
            let details = &record.details;
            [&details.education_period, &details.sentence_period]
                .into_iter()
                .flatten()
                .any(|period| period_end_year(period) == Some(year))
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
