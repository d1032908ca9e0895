//! enlist - recruitment roster CLI
//!
//! Classifies a cohort into its worklists, renders the dashboard, and
//! carries unresolved records into the next cycle.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use enlist::cli::{self, UpdateArgs, View};
use enlist::config::AppConfig;

/// enlist - recruitment roster CLI
#[derive(Parser, Debug)]
#[command(name = "enlist")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the roster database
    #[arg(long, default_value = "enlist.redb")]
    db: PathBuf,

    /// Path to the configuration file
    #[arg(short, long, default_value = "enlist.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Scope flags shared by the read commands.
#[derive(Args, Debug, Clone, Default)]
struct ViewArgs {
    /// Restrict to one province
    #[arg(long)]
    province: Option<String>,

    /// Restrict to one commune (requires --province)
    #[arg(long, requires = "province")]
    commune: Option<String>,

    /// View as a national administrator (hides the sandbox province)
    #[arg(long)]
    admin: bool,
}

impl From<ViewArgs> for View {
    fn from(args: ViewArgs) -> Self {
        View {
            province: args.province,
            commune: args.commune,
            admin: args.admin,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    // === Store management ===
    /// Create an empty roster database
    Init {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },

    /// Import records from a JSON array
    Import {
        /// JSON file
        file: PathBuf,
    },

    /// Apply a partial update to one record
    Update {
        /// Record id
        id: String,

        /// New status (e.g. DEFERRED, PRE_CHECK_PASSED)
        #[arg(long)]
        status: Option<String>,

        /// New enlistment type (OFFICIAL or RESERVE)
        #[arg(long)]
        enlistment_type: Option<String>,

        /// New deferment reason code
        #[arg(long, conflicts_with = "clear_reason")]
        reason: Option<String>,

        /// Remove the deferment reason
        #[arg(long)]
        clear_reason: bool,
    },

    // === Worklists ===
    /// List every worklist with its short code
    Lists {
        #[arg(long)]
        json: bool,
    },

    /// Print the members of one worklist
    Classify {
        /// Recruitment year
        #[arg(long)]
        year: i32,

        /// List name (e.g. total-source) or short code (e.g. DS4)
        #[arg(long)]
        list: String,

        #[command(flatten)]
        view: ViewArgs,

        #[arg(long)]
        json: bool,
    },

    /// Dashboard counts, charts and trend
    Stats {
        /// Recruitment year
        #[arg(long)]
        year: i32,

        #[command(flatten)]
        view: ViewArgs,

        #[arg(long)]
        json: bool,
    },

    /// Deferments whose period ends in the given year
    Expiring {
        /// Recruitment year
        #[arg(long)]
        year: i32,

        #[command(flatten)]
        view: ViewArgs,

        #[arg(long)]
        json: bool,
    },

    // === Year transfer ===
    /// Carry unresolved records into the next cycle
    Transfer {
        /// Source year
        #[arg(long)]
        from: i32,

        /// Target year
        #[arg(long)]
        to: i32,

        #[command(flatten)]
        view: ViewArgs,

        /// Show the plan without writing
        #[arg(long)]
        dry_run: bool,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let opts = Cli::parse();

    // Logs go to stderr so command output stays pipeable.
    let filter = EnvFilter::try_new(&opts.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::load_or_default(Some(&opts.config))?;
    let tables = &config.reference;
    let db = opts.db.as_path();

    match opts.command {
        Commands::Init { force } => cli::cmd_init(db, force),
        Commands::Import { file } => cli::cmd_import(db, &file).map(drop),
        Commands::Update {
            id,
            status,
            enlistment_type,
            reason,
            clear_reason,
        } => {
            let update = UpdateArgs {
                status,
                enlistment_type,
                reason,
                clear_reason,
            };
            cli::cmd_update(db, &id, &update)
        }
        Commands::Lists { json } => cli::cmd_lists(json).map(drop),
        Commands::Classify {
            year,
            list,
            view,
            json,
        } => cli::cmd_classify(db, tables, year, &list, &view.into(), json).map(drop),
        Commands::Stats { year, view, json } => {
            cli::cmd_stats(db, tables, year, &view.into(), json).map(drop)
        }
        Commands::Expiring { year, view, json } => {
            cli::cmd_expiring(db, tables, year, &view.into(), json).map(drop)
        }
        Commands::Transfer {
            from,
            to,
            view,
            dry_run,
            json,
        } => cli::cmd_transfer(db, tables, from, to, &view.into(), dry_run, json).map(drop),
    }
}
