//! # Enlist Core
//!
//! The deterministic rule engine behind the recruitment roster.
//!
//! Given a flat set of citizen records for one recruitment cycle, the core
//! derives the named worklists (total source, pre-check, medical exam,
//! deferred, remaining, next-year source, ...), aggregates them into
//! dashboard counts and charts, and plans the carryover of unresolved
//! records into the next cycle.
//!
//! ## Layout
//!
//! ```text
//! record ──► scope ──► classify ──► aggregate
//!                         │
//!                         └──────► transfer ──► store
//! ```
//!
//! Everything except `store` is a pure function of its inputs. Reference
//! data (deferment reason codes, the sandbox province) is passed in as
//! [`ReferenceTables`], never read from globals.

pub mod aggregate;
pub mod classify;
pub mod error;
pub mod record;
pub mod reference;
pub mod scope;
pub mod store;
pub mod transfer;

pub use aggregate::{Charts, Dashboard, Histogram, PoliticalSummary, aggregate, trend};
pub use classify::{Classifier, ListId, classify, expiring};
pub use error::{EnlistError, Result};
pub use record::{
    Address, Details, EnlistmentType, Physical, PoliticalStatus, Recruit, RecruitId,
    RecruitPatch, Status, age,
};
pub use reference::{DefermentCategory, ReferenceTables};
pub use scope::{Role, Scope, filter_all_years, filter_cohort};
pub use store::{MemoryStore, RecordStore, RedbStore};
pub use transfer::{TransferPlan, TransferStats, execute_transfer, plan_transfer};

// =============================================================================
// DOMAIN CONSTANTS
// =============================================================================

/// Minimum age (in reference-year terms) for any source list.
pub const MIN_AGE: i32 = 18;

/// Maximum age at the target year for carryover eligibility.
pub const MAX_AGE: i32 = 27;
