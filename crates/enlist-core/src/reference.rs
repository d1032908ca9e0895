//! # Reference Tables
//!
//! Static reference data injected at startup: deferment reason codes and
//! the reserved sandbox province. The classifier and aggregator receive a
//! `&ReferenceTables`; nothing here is global.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Default sentinel for empty grouping keys.
pub const DEFAULT_UNKNOWN_LABEL: &str = "Unknown";

/// Deferment sub-list a reason code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefermentCategory {
    Health,
    Education,
    Policy,
    /// Serving in the militia / self-defence force (DQTT).
    Militia,
    /// Code missing or not in the table.
    Other,
}

impl fmt::Display for DefermentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DefermentCategory::Health => "health",
            DefermentCategory::Education => "education",
            DefermentCategory::Policy => "policy",
            DefermentCategory::Militia => "militia",
            DefermentCategory::Other => "other",
        };
        f.write_str(name)
    }
}

/// Built-in reason codes: the four category codes plus the numbered legal
/// sub-clauses that map onto them.
const BUILTIN_REASONS: [(&str, DefermentCategory); 14] = [
    ("HEALTH", DefermentCategory::Health),
    ("HEALTH_1", DefermentCategory::Health),
    ("EDUCATION", DefermentCategory::Education),
    ("EDUCATION_1", DefermentCategory::Education),
    ("EDUCATION_2", DefermentCategory::Education),
    ("POLICY", DefermentCategory::Policy),
    ("POLICY_SOLE_LABOR", DefermentCategory::Policy),
    ("POLICY_FAMILY_HARDSHIP", DefermentCategory::Policy),
    ("POLICY_MARTYR_CHILD", DefermentCategory::Policy),
    ("POLICY_SIBLING_SERVING", DefermentCategory::Policy),
    ("POLICY_RELOCATION", DefermentCategory::Policy),
    ("POLICY_OFFICIAL_DUTY", DefermentCategory::Policy),
    ("MILITIA", DefermentCategory::Militia),
    ("DQTT", DefermentCategory::Militia),
];

/// Reference data for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceTables {
    /// Reason code -> deferment sub-list. Codes are matched after trimming
    /// and upper-casing.
    pub deferment_reasons: BTreeMap<String, DefermentCategory>,
    /// Test province hidden from national administrator views.
    pub sandbox_province: Option<String>,
    /// Label used for empty grouping keys.
    pub unknown_label: String,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self {
            deferment_reasons: BUILTIN_REASONS
                .iter()
                .map(|(code, category)| ((*code).to_string(), *category))
                .collect(),
            sandbox_province: None,
            unknown_label: DEFAULT_UNKNOWN_LABEL.to_string(),
        }
    }
}

impl ReferenceTables {
    /// Default tables with a sandbox province.
    #[must_use]
    pub fn with_sandbox(mut self, province: impl Into<String>) -> Self {
        self.sandbox_province = Some(province.into());
        self
    }

    /// Category for a reason code. Missing or unknown codes map to `Other`.
    #[must_use]
    pub fn deferment_category(&self, reason: Option<&str>) -> DefermentCategory {
        let Some(reason) = reason else {
            return DefermentCategory::Other;
        };
        let key = reason.trim().to_uppercase();
        self.deferment_reasons
            .get(&key)
            .copied()
            .unwrap_or(DefermentCategory::Other)
    }

    /// Whether `province` is the configured sandbox.
    #[must_use]
    pub fn is_sandbox(&self, province: &str) -> bool {
        self.sandbox_province
            .as_deref()
            .is_some_and(|sandbox| sandbox.trim() == province.trim())
    }
}

// =============================================================================
// TESTS
// =============================================================================
