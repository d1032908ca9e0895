//! # Configuration
//!
//! `enlist.toml` supplies the reference tables. Every key is optional; a
//! missing file means built-in defaults.
//!
//! ```toml
//! [reference]
//! sandbox_province = "Tinh Thu Nghiem"
//! unknown_label = "Chua ro"
//!
//! [reference.deferment_reasons]
//! POLICY_DISASTER_AREA = "policy"
//! ```
//!
//! Reason codes listed here are added to (or override) the built-in table.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use enlist_core::{DefermentCategory, ReferenceTables};

/// Loaded configuration. Immutable after [`AppConfig::load_or_default`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub reference: ReferenceTables,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    reference: RawReference,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawReference {
    sandbox_province: Option<String>,
    unknown_label: Option<String>,
    deferment_reasons: BTreeMap<String, DefermentCategory>,
}

impl AppConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(text).context("invalid configuration")?;
        let mut reference = ReferenceTables::default();

        if let Some(province) = raw.reference.sandbox_province {
            let province = province.trim().to_string();
            if !province.is_empty() {
                reference.sandbox_province = Some(province);
            }
        }
        if let Some(label) = raw.reference.unknown_label {
            reference.unknown_label = label;
        }
        for (code, category) in raw.reference.deferment_reasons {
            // Lookups upper-case the record's code, so stored keys must match.
            reference
                .deferment_reasons
                .insert(code.trim().to_uppercase(), category);
        }

        Ok(Self { reference })
    }

    /// Read and parse the file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load `path` when given and present, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => {
                let config = Self::load(path)?;
                debug!(
                    path = %path.display(),
                    reasons = config.reference.deferment_reasons.len(),
                    "configuration loaded"
                );
                Ok(config)
            }
            Some(path) => {
                debug!(path = %path.display(), "no configuration file; using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
