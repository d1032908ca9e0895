//! # CLI Commands
//!
//! One `cmd_*` function per subcommand. Each opens the store it needs, runs
//! the core, prints to stdout and returns a summary value so tests can
//! assert on the outcome without scraping output.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing::{info, warn};

use enlist_core::{
    Dashboard, EnlistError, EnlistmentType, Histogram, ListId, RecordStore, Recruit, RecruitId,
    RecruitPatch, RedbStore, ReferenceTables, Role, Scope, Status, TransferStats, aggregate,
    classify, execute_transfer, expiring, plan_transfer, trend,
};

// =============================================================================
// SHARED OPTIONS
// =============================================================================

/// Who is looking and at what part of the country.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    pub province: Option<String>,
    pub commune: Option<String>,
    pub admin: bool,
}

impl View {
    /// The organizational scope these options select.
    pub fn scope(&self) -> Scope {
        Scope::from_parts(self.province.as_deref(), self.commune.as_deref())
    }

    /// The viewer's role.
    pub fn role(&self) -> Role {
        if self.admin {
            Role::Administrator
        } else {
            Role::Officer
        }
    }
}

/// Open an existing store, with a hint when it is missing.
pub fn open_store(db: &Path) -> Result<RedbStore> {
    if !db.exists() {
        bail!(
            "database not found: {} (run `enlist init` first)",
            db.display()
        );
    }
    RedbStore::open(db).with_context(|| format!("failed to open {}", db.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_record_rows(records: &[&Recruit]) {
    for record in records {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            record.id,
            record.full_name,
            record.dob.as_deref().unwrap_or("-"),
            record.status,
            record.address.commune
        );
    }
}

// =============================================================================
// INIT / IMPORT
// =============================================================================

/// Create an empty store at `db`.
pub fn cmd_init(db: &Path, force: bool) -> Result<()> {
    if db.exists() {
        if !force {
            bail!(
                "database already exists at {} (use --force to overwrite)",
                db.display()
            );
        }
        std::fs::remove_file(db)
            .with_context(|| format!("failed to remove {}", db.display()))?;
    }

    RedbStore::create(db).with_context(|| format!("failed to create {}", db.display()))?;
    info!(path = %db.display(), "store initialized");
    println!("Initialized empty roster at {}", db.display());
    Ok(())
}

/// Bulk-create records from a JSON array. All or nothing.
pub fn cmd_import(db: &Path, file: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let records: Vec<Recruit> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of records", file.display()))?;
    let count = records.len();

    let mut store = open_store(db)?;
    store
        .bulk_create(records)
        .context("import rejected; nothing was written")?;

    info!(records = count, "import committed");
    println!("Imported {count} records");
    Ok(count)
}

// =============================================================================
// LISTS / CLASSIFY
// =============================================================================

/// Print every list id with its short code.
pub fn cmd_lists(json: bool) -> Result<usize> {
    if json {
        let rows: Vec<_> = ListId::ALL
            .iter()
            .map(|list| json!({ "name": list.name(), "code": list.code() }))
            .collect();
        print_json(&rows)?;
    } else {
        for list in ListId::ALL {
            println!("{:<22} {}", list.name(), list.code().unwrap_or(""));
        }
    }
    Ok(ListId::ALL.len())
}

/// Print the members of one list for a cohort.
pub fn cmd_classify(
    db: &Path,
    tables: &ReferenceTables,
    year: i32,
    list: &str,
    view: &View,
    json: bool,
) -> Result<usize> {
    let list: ListId = list.parse()?;
    let store = open_store(db)?;
    let cohort = store.fetch_cohort(year, &view.scope(), view.role(), tables);
    let members = classify(&cohort, list, year, tables);

    if json {
        print_json(&members)?;
    } else {
        println!("{list} {year} ({}): {} records", view.scope(), members.len());
        print_record_rows(&members);
    }
    Ok(members.len())
}

// =============================================================================
// STATS
// =============================================================================

/// Dashboard plus the per-year trend for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub scope: Scope,
    pub dashboard: Dashboard,
    pub trend: Vec<(i32, usize)>,
}

fn print_histogram(title: &str, histogram: &Histogram) {
    if histogram.is_empty() {
        return;
    }
    println!("{title}:");
    for (key, count) in histogram {
        println!("  {key:<24} {count}");
    }
}

fn print_report(report: &StatsReport) {
    let dashboard = &report.dashboard;
    println!("Cohort {} ({})", dashboard.reference_year, report.scope);
    for (list, count) in &dashboard.counts {
        let code = list.code().unwrap_or("");
        println!("  {:<22} {code:<5} {count}", list.name());
    }

    let charts = &dashboard.charts;
    print_histogram("Education", &charts.education);
    print_histogram("Ethnicity", &charts.ethnicity);
    print_histogram("Religion", &charts.religion);
    print_histogram("Job", &charts.job);
    print_histogram("Geography", &charts.geography);
    print_histogram("Health grade", &charts.health_grade);
    print_histogram("BMI", &charts.bmi);

    let political = &dashboard.political;
    println!(
        "Political: party {} ({}‰), union {} ({}‰) of {}",
        political.party,
        political.party_per_mille,
        political.union,
        political.union_per_mille,
        political.total
    );

    println!("Trend:");
    for (year, count) in &report.trend {
        println!("  {year} {count}");
    }
}

/// Aggregate the dashboard for a cohort.
pub fn cmd_stats(
    db: &Path,
    tables: &ReferenceTables,
    year: i32,
    view: &View,
    json: bool,
) -> Result<StatsReport> {
    let store = open_store(db)?;
    let scope = view.scope();
    let role = view.role();

    let cohort = store.fetch_cohort(year, &scope, role, tables);
    let dashboard = aggregate(&cohort, year, &scope, tables);
    let all_years = store.fetch_all(&scope, role, tables);
    let report = StatsReport {
        trend: trend(&all_years),
        scope,
        dashboard,
    };

    if json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(report)
}

// =============================================================================
// TRANSFER
// =============================================================================

/// Carry unresolved records from `from` into `to`.
///
/// With `dry_run` the plan is printed and nothing is written. An empty plan
/// is a warning, not an error.
pub fn cmd_transfer(
    db: &Path,
    tables: &ReferenceTables,
    from: i32,
    to: i32,
    view: &View,
    dry_run: bool,
    json: bool,
) -> Result<TransferStats> {
    let mut store = open_store(db)?;
    let scope = view.scope();
    let role = view.role();
    let cohort = store.fetch_cohort(from, &scope, role, tables);

    let plan = match plan_transfer(&cohort, from, to, tables) {
        Ok(plan) => plan,
        Err(err @ EnlistError::EmptyTransfer { .. }) => {
            warn!(from, to, %scope, "empty transfer");
            println!("Warning: {err}; nothing written");
            return Ok(TransferStats::default());
        }
        Err(err) => return Err(err.into()),
    };
    let stats = plan.stats;

    if json {
        print_json(&json!({ "dryRun": dry_run, "stats": stats }))?;
    } else {
        println!("Transfer {from} -> {to} ({scope})");
        println!("  first-time -> source  {}", stats.first_time_to_source);
        println!("  status kept           {}", stats.kept_status);
        println!("  reset to source       {}", stats.reset_to_source);
        println!("  excluded (over age)   {}", stats.excluded_over_age);
        println!("  excluded (no dob)     {}", stats.excluded_unknown_age);
    }

    if dry_run {
        println!("Dry run: {} records would be created", stats.transferred());
        return Ok(stats);
    }

    let written = execute_transfer(plan, &mut store, &scope, role, tables)
        .with_context(|| format!("transfer {from} -> {to} refused"))?;
    println!("Created {written} records in {to}");
    Ok(stats)
}

// =============================================================================
// EXPIRING / UPDATE
// =============================================================================

/// Deferred records whose study or sentence period ends in `year`.
pub fn cmd_expiring(
    db: &Path,
    tables: &ReferenceTables,
    year: i32,
    view: &View,
    json: bool,
) -> Result<usize> {
    let store = open_store(db)?;
    let cohort = store.fetch_cohort(year, &view.scope(), view.role(), tables);
    let lapsing = expiring(&cohort, year);

    if json {
        print_json(&lapsing)?;
    } else {
        println!("Deferments ending in {year}: {}", lapsing.len());
        print_record_rows(&lapsing);
    }
    Ok(lapsing.len())
}

/// Fields `enlist update` can change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateArgs {
    pub status: Option<String>,
    pub enlistment_type: Option<String>,
    pub reason: Option<String>,
    pub clear_reason: bool,
}

impl UpdateArgs {
    fn to_patch(&self) -> Result<RecruitPatch> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<Status>)
            .transpose()?;
        let enlistment_type = self
            .enlistment_type
            .as_deref()
            .map(str::parse::<EnlistmentType>)
            .transpose()?
            .map(Some);
        let deferment_reason = if self.clear_reason {
            Some(None)
        } else {
            self.reason.clone().map(Some)
        };

        Ok(RecruitPatch {
            status,
            enlistment_type,
            deferment_reason,
            ..RecruitPatch::default()
        })
    }
}

/// Apply a partial update to one record.
pub fn cmd_update(db: &Path, id: &str, args: &UpdateArgs) -> Result<()> {
    let patch = args.to_patch()?;
    if patch == RecruitPatch::default() {
        bail!("nothing to update (pass --status, --enlistment-type or --reason)");
    }

    let mut store = open_store(db)?;
    let id = RecruitId::new(id);
    store
        .update_record(&id, &patch)
        .with_context(|| format!("failed to update {id}"))?;

    info!(%id, "record updated");
    println!("Updated {id}");
    Ok(())
}
