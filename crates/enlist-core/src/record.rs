//! # Record Model
//!
//! The citizen record and its status vocabulary.
//!
//! Each recruitment year is its own cohort: a record belongs to exactly one
//! `recruitment_year`, and carrying a citizen into the next cycle produces a
//! new record (with `source_id` pointing back) rather than editing the old one.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EnlistError;

/// Earliest birth year accepted as real data. Anything older is treated as
/// a parse artifact (`0`, `1`, `0001-01-01`, ...).
pub const MIN_PLAUSIBLE_BIRTH_YEAR: i32 = 1900;

/// Date formats accepted for `dob`, tried in order.
const DOB_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Store-assigned record identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecruitId(pub String);

impl RecruitId {
    /// Create an id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecruitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// The closed set of roster statuses.
///
/// Exactly one status applies to a record at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    NotAllowedRegistration,
    ExemptRegistration,
    FirstTimeRegistration,
    Source,
    #[serde(rename = "NOT_SELECTED_TT50")]
    NotSelectedTt50,
    PreCheckPassed,
    PreCheckFailed,
    MedExamPassed,
    MedExamFailed,
    Finalized,
    Enlisted,
    Deferred,
    Exempted,
    RemovedFromSource,
    Deleted,
}

impl Status {
    /// Every status, in roster order.
    pub const ALL: [Status; 15] = [
        Status::NotAllowedRegistration,
        Status::ExemptRegistration,
        Status::FirstTimeRegistration,
        Status::Source,
        Status::NotSelectedTt50,
        Status::PreCheckPassed,
        Status::PreCheckFailed,
        Status::MedExamPassed,
        Status::MedExamFailed,
        Status::Finalized,
        Status::Enlisted,
        Status::Deferred,
        Status::Exempted,
        Status::RemovedFromSource,
        Status::Deleted,
    ];

    /// Wire name, as stored and accepted by [`FromStr`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Status::NotAllowedRegistration => "NOT_ALLOWED_REGISTRATION",
            Status::ExemptRegistration => "EXEMPT_REGISTRATION",
            Status::FirstTimeRegistration => "FIRST_TIME_REGISTRATION",
            Status::Source => "SOURCE",
            Status::NotSelectedTt50 => "NOT_SELECTED_TT50",
            Status::PreCheckPassed => "PRE_CHECK_PASSED",
            Status::PreCheckFailed => "PRE_CHECK_FAILED",
            Status::MedExamPassed => "MED_EXAM_PASSED",
            Status::MedExamFailed => "MED_EXAM_FAILED",
            Status::Finalized => "FINALIZED",
            Status::Enlisted => "ENLISTED",
            Status::Deferred => "DEFERRED",
            Status::Exempted => "EXEMPTED",
            Status::RemovedFromSource => "REMOVED_FROM_SOURCE",
            Status::Deleted => "DELETED",
        }
    }

    /// Human-readable label for rendering layers.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Status::NotAllowedRegistration => "Not allowed to register",
            Status::ExemptRegistration => "Exempt from registration",
            Status::FirstTimeRegistration => "First-time registration",
            Status::Source => "Source",
            Status::NotSelectedTt50 => "Not selected (TT50)",
            Status::PreCheckPassed => "Pre-check passed",
            Status::PreCheckFailed => "Pre-check failed",
            Status::MedExamPassed => "Medical exam passed",
            Status::MedExamFailed => "Medical exam failed",
            Status::Finalized => "Finalized",
            Status::Enlisted => "Enlisted",
            Status::Deferred => "Deferred",
            Status::Exempted => "Exempted",
            Status::RemovedFromSource => "Removed from source",
            Status::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Status {
    type Err = EnlistError;

    /// Accepts the wire name in any case, with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_").to_ascii_uppercase();
        Status::ALL
            .into_iter()
            .find(|status| status.name() == wanted)
            .ok_or_else(|| EnlistError::UnknownStatus(s.to_string()))
    }
}

/// How a finalized record is (or will be) enlisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnlistmentType {
    /// Departed for active service. Terminal for carryover.
    Official,
    /// Finalized but not yet departed.
    Reserve,
}

impl FromStr for EnlistmentType {
    type Err = EnlistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OFFICIAL" => Ok(EnlistmentType::Official),
            "RESERVE" => Ok(EnlistmentType::Reserve),
            _ => Err(EnlistError::UnknownStatus(s.to_string())),
        }
    }
}

/// Party/union affiliation, derived from the free-text political status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoliticalStatus {
    Party,
    Union,
    None,
}

impl PoliticalStatus {
    /// Classify a free-text political status.
    ///
    /// Party membership wins when both keywords appear.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        if ["đảng", "dang vien", "party"].iter().any(|k| lower.contains(k)) {
            PoliticalStatus::Party
        } else if ["đoàn", "doan vien", "union"].iter().any(|k| lower.contains(k)) {
            PoliticalStatus::Union
        } else {
            PoliticalStatus::None
        }
    }
}

// =============================================================================
// RECORD PARTS
// =============================================================================

/// Residential address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub village: String,
    pub commune: String,
    pub province: String,
}

/// Background details used for grouping and expiry tracking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Details {
    pub education: String,
    pub ethnicity: String,
    pub religion: String,
    pub job: String,
    pub political_status: String,
    /// Study period, `"YYYY-YYYY"` or `"YYYY"`.
    pub education_period: Option<String>,
    /// Sentence period, `"YYYY-YYYY"` or `"YYYY"`.
    pub sentence_period: Option<String>,
}

/// Physical assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Physical {
    /// Health grade 1 (best) to 6.
    pub health_grade: Option<u8>,
    pub bmi: Option<f64>,
}

// =============================================================================
// RECRUIT
// =============================================================================

/// One citizen in one recruitment cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recruit {
    pub id: RecruitId,
    #[serde(default)]
    pub full_name: String,
    /// Raw date of birth as supplied by the store. See [`Recruit::birth_year`].
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub citizen_id: String,
    pub recruitment_year: i32,
    pub status: Status,
    #[serde(default)]
    pub enlistment_type: Option<EnlistmentType>,
    #[serde(default)]
    pub deferment_reason: Option<String>,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub details: Details,
    #[serde(default)]
    pub physical: Physical,
    /// The record this one was carried over from.
    #[serde(default)]
    pub source_id: Option<RecruitId>,
}

impl Recruit {
    /// Create a bare record. Everything but id, year and status is empty.
    pub fn new(id: impl Into<String>, recruitment_year: i32, status: Status) -> Self {
        Self {
            id: RecruitId::new(id),
            full_name: String::new(),
            dob: None,
            citizen_id: String::new(),
            recruitment_year,
            status,
            enlistment_type: None,
            deferment_reason: None,
            address: Address::default(),
            details: Details::default(),
            physical: Physical::default(),
            source_id: None,
        }
    }

    /// Set the date of birth.
    #[must_use]
    pub fn with_dob(mut self, dob: impl Into<String>) -> Self {
        self.dob = Some(dob.into());
        self
    }

    /// Set the enlistment type.
    #[must_use]
    pub fn with_enlistment(mut self, enlistment_type: EnlistmentType) -> Self {
        self.enlistment_type = Some(enlistment_type);
        self
    }

    /// Set the deferment reason code.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.deferment_reason = Some(reason.into());
        self
    }

    /// Set province, commune and village.
    #[must_use]
    pub fn with_address(
        mut self,
        province: impl Into<String>,
        commune: impl Into<String>,
        village: impl Into<String>,
    ) -> Self {
        self.address = Address {
            village: village.into(),
            commune: commune.into(),
            province: province.into(),
        };
        self
    }

    /// Birth year parsed from `dob`.
    ///
    /// Accepts `YYYY-MM-DD` (optionally followed by a time part), `DD/MM/YYYY`,
    /// `DD-MM-YYYY` and a bare `YYYY`. Only the year matters, so a date whose
    /// day does not exist (`2000-02-30`) still yields its year. Returns `None`
    /// when no year can be read and for years before
    /// [`MIN_PLAUSIBLE_BIRTH_YEAR`].
    #[must_use]
    pub fn birth_year(&self) -> Option<i32> {
        let raw = self.dob.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }

        let year = if raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()) {
            raw.parse::<i32>().ok()
        } else {
            let date_part = raw.split(['T', ' ']).next().unwrap_or(raw);
            DOB_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
                .map(|date| date.year())
                .or_else(|| year_token(date_part))
        }?;

        (year >= MIN_PLAUSIBLE_BIRTH_YEAR).then_some(year)
    }

    /// Finalized or enlisted with official enlistment: gone for carryover purposes.
    #[must_use]
    pub fn is_departed(&self) -> bool {
        matches!(self.status, Status::Finalized | Status::Enlisted)
            && self.enlistment_type == Some(EnlistmentType::Official)
    }

    /// Apply a partial update in place.
    pub fn apply(&mut self, patch: &RecruitPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(enlistment_type) = patch.enlistment_type {
            self.enlistment_type = enlistment_type;
        }
        if let Some(reason) = &patch.deferment_reason {
            self.deferment_reason.clone_from(reason);
        }
        if let Some(address) = &patch.address {
            self.address.clone_from(address);
        }
        if let Some(details) = &patch.details {
            self.details.clone_from(details);
        }
        if let Some(physical) = &patch.physical {
            self.physical.clone_from(physical);
        }
    }
}

/// Year field of a date-shaped string whose day or month is out of range:
/// leading `YYYY-..` or trailing `../YYYY`, `..-YYYY`.
fn year_token(date_part: &str) -> Option<i32> {
    if date_part.len() <= 4 {
        return None;
    }
    let is_year = |token: &&str| token.len() == 4 && token.bytes().all(|b| b.is_ascii_digit());
    let leading = date_part.split('-').next().filter(is_year);
    let trailing = date_part.rsplit(['/', '-']).next().filter(is_year);
    leading.or(trailing).and_then(|token| token.parse().ok())
}

/// Age in reference-year terms: `reference_year - birth_year`.
///
/// `None` when the birth year is unknown or later than `reference_year`;
/// such records fail every age gate.
#[must_use]
pub fn age(record: &Recruit, reference_year: i32) -> Option<i32> {
    record
        .birth_year()
        .filter(|birth| *birth <= reference_year)
        .map(|birth| reference_year.saturating_sub(birth))
}

/// Partial update for a single record.
///
/// Outer `None` leaves the field untouched; for nullable fields the inner
/// `Option` is the new value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecruitPatch {
    pub status: Option<Status>,
    pub enlistment_type: Option<Option<EnlistmentType>>,
    pub deferment_reason: Option<Option<String>>,
    pub address: Option<Address>,
    pub details: Option<Details>,
    pub physical: Option<Physical>,
}

impl RecruitPatch {
    /// Patch that only changes the status.
    #[must_use]
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
