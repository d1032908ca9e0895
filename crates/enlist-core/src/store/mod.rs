//! # Store Module
//!
//! The record store the engine reads cohorts from and writes transfers to.
//!
//! Reads are fail-soft: a backend error is logged and surfaces as an empty
//! result, which callers treat as "no data". Writes are all-or-nothing and
//! report failure as an error.
//!
//! Backends:
//! - [`MemoryStore`]: `BTreeMap` keyed by id, for tests and one-shot runs
//! - [`RedbStore`]: redb embedded database, postcard-encoded records

mod redb_store;

pub use redb_store::RedbStore;

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::error::{EnlistError, Result};
use crate::record::{Recruit, RecruitId, RecruitPatch};
use crate::reference::ReferenceTables;
use crate::scope::{Role, Scope};

// =============================================================================
// RECORD STORE TRAIT
// =============================================================================

/// Persistence collaborator for the engine.
pub trait RecordStore {
    /// Every stored record, in id order. Errors propagate.
    fn load_all(&self) -> Result<Vec<Recruit>>;

    /// Insert all records or none. Fails if any id exists already or
    /// repeats within the batch.
    fn bulk_create(&mut self, records: Vec<Recruit>) -> Result<()>;

    /// Apply a partial update to one record.
    fn update_record(&mut self, id: &RecruitId, patch: &RecruitPatch) -> Result<()>;

    /// Number of records of `year` inside `scope`. Unlike the fetches,
    /// errors propagate: a failed count must not read as an empty year.
    fn count_cohort(
        &self,
        year: i32,
        scope: &Scope,
        role: Role,
        tables: &ReferenceTables,
    ) -> Result<usize> {
        Ok(self
            .load_all()?
            .iter()
            .filter(|r| r.recruitment_year == year && scope.contains(r, role, tables))
            .count())
    }

    /// Records of `year` inside `scope`. Empty on backend error.
    fn fetch_cohort(
        &self,
        year: i32,
        scope: &Scope,
        role: Role,
        tables: &ReferenceTables,
    ) -> Vec<Recruit> {
        let cohort: Vec<Recruit> = self
            .fetch_all(scope, role, tables)
            .into_iter()
            .filter(|r| r.recruitment_year == year)
            .collect();
        debug!(year, %scope, records = cohort.len(), "cohort fetched");
        cohort
    }

    /// Records of every year inside `scope`. Empty on backend error.
    fn fetch_all(&self, scope: &Scope, role: Role, tables: &ReferenceTables) -> Vec<Recruit> {
        match self.load_all() {
            Ok(records) => records
                .into_iter()
                .filter(|r| scope.contains(r, role, tables))
                .collect(),
            Err(err) => {
                warn!(error = %err, "record store read failed; treating as empty");
                Vec::new()
            }
        }
    }
}

/// Reject a batch that repeats an id internally.
pub(crate) fn check_batch_ids(records: &[Recruit]) -> Result<()> {
    let mut seen = BTreeSet::new();
    for record in records {
        if !seen.insert(&record.id) {
            return Err(EnlistError::DuplicateRecord(record.id.to_string()));
        }
    }
    Ok(())
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// In-memory store keyed by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<RecruitId, Recruit>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_records(records: Vec<Recruit>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id.clone(), r)).collect(),
        }
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up one record.
    #[must_use]
    pub fn get(&self, id: &RecruitId) -> Option<&Recruit> {
        self.records.get(id)
    }
}

impl RecordStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Recruit>> {
        Ok(self.records.values().cloned().collect())
    }

    fn bulk_create(&mut self, records: Vec<Recruit>) -> Result<()> {
        check_batch_ids(&records)?;
        if let Some(existing) = records.iter().find(|r| self.records.contains_key(&r.id)) {
            return Err(EnlistError::DuplicateRecord(existing.id.to_string()));
        }
        for record in records {
            self.records.insert(record.id.clone(), record);
        }
        Ok(())
    }

    fn update_record(&mut self, id: &RecruitId, patch: &RecruitPatch) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| EnlistError::RecordNotFound(id.to_string()))?;
        record.apply(patch);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
