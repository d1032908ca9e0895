//! # Aggregator
//!
//! Dashboard counters, grouped histograms, the political-affiliation summary
//! and the multi-year trend.
//!
//! Demographic breakdowns use TOTAL_SOURCE as the denominator. Grouping keys
//! go through [`normalize_key`] so `"kinh"`, `" Kinh"` and `"KINH"` land in
//! the same bucket.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::classify::{Classifier, ListId, REGISTRATION_EXCLUDED};
use crate::record::{PoliticalStatus, Recruit, age};
use crate::reference::ReferenceTables;
use crate::scope::Scope;
use crate::{MAX_AGE, MIN_AGE};

/// Top-N limits per chart.
pub const ETHNICITY_TOP: usize = 5;
pub const JOB_TOP: usize = 8;
pub const GEOGRAPHY_TOP: usize = 10;

/// BMI bucket labels.
pub const BMI_UNDER: &str = "<18.5";
pub const BMI_NORMAL: &str = "18.5-25";
pub const BMI_OVER: &str = ">25";

/// `(key, count)` pairs, count descending then key ascending.
pub type Histogram = Vec<(String, usize)>;

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Grouped breakdowns of the total source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Charts {
    pub education: Histogram,
    pub ethnicity: Histogram,
    pub religion: Histogram,
    pub job: Histogram,
    pub geography: Histogram,
    /// Grades "1" to "6", always present, in grade order.
    pub health_grade: Histogram,
    /// The three BMI buckets, always present, in bucket order.
    pub bmi: Histogram,
}

/// Party and union membership over the total source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoliticalSummary {
    pub total: usize,
    pub party: usize,
    pub union: usize,
    pub party_per_mille: u32,
    pub union_per_mille: u32,
}

impl PoliticalSummary {
    fn from_records<'r>(records: impl IntoIterator<Item = &'r Recruit>) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.total = summary.total.saturating_add(1);
            match PoliticalStatus::from_text(&record.details.political_status) {
                PoliticalStatus::Party => summary.party = summary.party.saturating_add(1),
                PoliticalStatus::Union => summary.union = summary.union.saturating_add(1),
                PoliticalStatus::None => {}
            }
        }
        summary.party_per_mille = per_mille(summary.party, summary.total);
        summary.union_per_mille = per_mille(summary.union, summary.total);
        summary
    }
}

/// Everything the dashboard renders for one cohort and scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
    pub reference_year: i32,
    pub counts: BTreeMap<ListId, usize>,
    pub charts: Charts,
    pub political: PoliticalSummary,
}

impl Dashboard {
    /// Count for one list (0 when absent).
    #[must_use]
    pub fn count(&self, list: ListId) -> usize {
        self.counts.get(&list).copied().unwrap_or(0)
    }
}

// =============================================================================
// KEY NORMALIZATION
// =============================================================================

/// Trim, replace empty with `unknown`, then capitalize the first letter and
/// lowercase the rest.
#[must_use]
pub fn normalize_key(raw: &str, unknown: &str) -> String {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    match chars.next() {
        None => unknown.to_string(),
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
    }
}

/// Integer per-mille; zero denominator yields zero.
fn per_mille(part: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        (part.saturating_mul(1000) / total) as u32
    }
}

// =============================================================================
// HISTOGRAMS
// =============================================================================

fn tally<I: IntoIterator<Item = String>>(keys: I) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for key in keys {
        let count: &mut usize = counts.entry(key).or_default();
        *count = count.saturating_add(1);
    }
    counts
}

/// Sort by count descending (ties by key) and keep at most `limit` entries.
fn ranked(counts: BTreeMap<String, usize>, limit: Option<usize>) -> Histogram {
    let mut entries: Histogram = counts.into_iter().collect();
    // BTreeMap order already breaks ties by key; the sort is stable.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

fn grouped<'r, F>(records: &[&'r Recruit], unknown: &str, limit: Option<usize>, key: F) -> Histogram
where
    F: Fn(&'r Recruit) -> &'r str,
{
    ranked(
        tally(records.iter().copied().map(|r| normalize_key(key(r), unknown))),
        limit,
    )
}

fn health_grades(records: &[&Recruit], unknown: &str) -> Histogram {
    let mut grades = [0usize; 6];
    let mut missing = 0usize;
    for record in records {
        match record.physical.health_grade {
            Some(grade @ 1..=6) => {
                let slot = &mut grades[usize::from(grade - 1)];
                *slot = slot.saturating_add(1);
            }
            _ => missing = missing.saturating_add(1),
        }
    }
    let mut histogram: Histogram = grades
        .iter()
        .enumerate()
        .map(|(index, count)| ((index + 1).to_string(), *count))
        .collect();
    if missing > 0 {
        histogram.push((unknown.to_string(), missing));
    }
    histogram
}

fn bmi_buckets(records: &[&Recruit], unknown: &str) -> Histogram {
    let (mut under, mut normal, mut over, mut missing) = (0usize, 0usize, 0usize, 0usize);
    for record in records {
        let bucket = match record.physical.bmi {
            Some(bmi) if bmi.is_nan() => &mut missing,
            Some(bmi) if bmi < 18.5 => &mut under,
            Some(bmi) if bmi <= 25.0 => &mut normal,
            Some(_) => &mut over,
            None => &mut missing,
        };
        *bucket = bucket.saturating_add(1);
    }
    let mut histogram = vec![
        (BMI_UNDER.to_string(), under),
        (BMI_NORMAL.to_string(), normal),
        (BMI_OVER.to_string(), over),
    ];
    if missing > 0 {
        histogram.push((unknown.to_string(), missing));
    }
    histogram
}

// =============================================================================
// AGGREGATE
// =============================================================================

/// Build the dashboard for an already scoped cohort.
///
/// `scope` only decides the geography key: communes when the commune is
/// pinned, villages otherwise.
pub fn aggregate<'r, I>(
    cohort: I,
    reference_year: i32,
    scope: &Scope,
    tables: &ReferenceTables,
) -> Dashboard
where
    I: IntoIterator<Item = &'r Recruit>,
{
    let classifier = Classifier::new(reference_year, tables);
    let cohort: Vec<&Recruit> = cohort.into_iter().collect();
    let counts = classifier.counts(cohort.iter().copied());
    let source = classifier.select(ListId::TotalSource, cohort.iter().copied());
    let unknown = tables.unknown_label.as_str();

    let geography = if scope.pins_commune() {
        grouped(&source, unknown, Some(GEOGRAPHY_TOP), |r| r.address.commune.as_str())
    } else {
        grouped(&source, unknown, Some(GEOGRAPHY_TOP), |r| r.address.village.as_str())
    };

    // Only ethnicity, job and geography are capped; education and religion
    // list every bucket.
    let charts = Charts {
        education: grouped(&source, unknown, None, |r| r.details.education.as_str()),
        ethnicity: grouped(&source, unknown, Some(ETHNICITY_TOP), |r| r.details.ethnicity.as_str()),
        religion: grouped(&source, unknown, None, |r| r.details.religion.as_str()),
        job: grouped(&source, unknown, Some(JOB_TOP), |r| r.details.job.as_str()),
        geography,
        health_grade: health_grades(&source, unknown),
        bmi: bmi_buckets(&source, unknown),
    };

    Dashboard {
        reference_year,
        counts,
        charts,
        political: PoliticalSummary::from_records(source.iter().copied()),
    }
}

/// Eligible-age source size per cohort year, ascending by year.
///
/// `records` spans every year but must already be restricted to the viewer's
/// scope. A record counts for its own cohort year when its age at that year
/// is within 18..=27 and its status is not a registration exclusion.
pub fn trend<'r, I>(records: I) -> Vec<(i32, usize)>
where
    I: IntoIterator<Item = &'r Recruit>,
{
    let mut by_year: BTreeMap<i32, usize> = BTreeMap::new();
    for record in records {
        let year = record.recruitment_year;
        let count = by_year.entry(year).or_default();
        let eligible = age(record, year).is_some_and(|a| (MIN_AGE..=MAX_AGE).contains(&a))
            && !REGISTRATION_EXCLUDED.contains(&record.status);
        if eligible {
            *count = count.saturating_add(1);
        }
    }
    by_year.into_iter().collect()
}

// =============================================================================
// TESTS
// =============================================================================
