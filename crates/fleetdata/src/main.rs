use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use fleetdata::config::validate_config;
use fleetdata::db::job_repo::{JobFilter, JobRow};
use fleetdata::db::pallet_repo::PalletUpdate;
use fleetdata::tracking::parse_payload;
use fleetdata::{load_config, logging, CheckpointRecord, CheckpointUpdate, Config, Tracker};

const DEFAULT_CONFIG_FILE: &str = "fleetdata.json";

/// Track trucking jobs through their checkpoints.
#[derive(Debug, Parser)]
#[command(name = "fleetdata", version, long_about = None)]
struct CliArgs {
    /// Path to the config file (JSON). Defaults to `fleetdata.json` if present.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config.
    #[arg(long, value_name = "PATH", global = true)]
    database: Option<String>,

    /// Log level (error, warn, info, debug, trace, off), overriding the config.
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a job from a JSON file (`-` for stdin).
    Create { input: String },
    /// Apply a checkpoint update from a JSON file (`-` for stdin).
    Update {
        input: String,
        /// Never propagate to the dispatch group.
        #[arg(long)]
        single: bool,
    },
    /// Show a job and its checkpoint record.
    Show { load_id: String },
    /// List jobs.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        origin: Option<String>,
        #[arg(long, value_name = "DATE")]
        from: Option<String>,
        #[arg(long, value_name = "DATE")]
        to: Option<String>,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        offset: Option<u64>,
    },
    /// Delete a job with its checkpoint and pallet records.
    Delete { load_id: String },
    /// Re-derive and repair a job's stored status.
    Refresh { load_id: String },
    /// Derive the status of a checkpoint record JSON without saving it.
    Preview {
        input: String,
        /// Origin location used to pick the rule variant.
        #[arg(long)]
        origin: Option<String>,
    },
    /// Record pallet counters from a JSON file (`-` for stdin).
    Pallets { input: String },
}

#[derive(Serialize)]
struct JobView {
    job: JobRow,
    checkpoints: CheckpointRecord,
}

#[derive(Serialize)]
struct JobList {
    total: u64,
    jobs: Vec<JobRow>,
}

fn main() {
    if let Err(err) = run_main() {
        eprintln!("fleetdata error: {err:#}");
        let client_error = err
            .downcast_ref::<fleetdata::TrackingError>()
            .map(|e| e.is_client_error())
            .unwrap_or(false);
        std::process::exit(if client_error { 2 } else { 1 });
    }
}

fn run_main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    let mut config = resolve_config(args.config.as_deref())?;
    if let Some(path) = args.database {
        config.database.path = Some(path);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    validate_config(&config)?;
    logging::init_logging(&config.logging)?;

    let tracker = Tracker::from_config(&config)?;
    run(&tracker, args.command)
}

fn resolve_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => Ok(load_config(DEFAULT_CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}

fn run(tracker: &Tracker, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Create { input } => {
            let draft: JobRow = parse_payload(&read_input(&input)?)?;
            print_json(&tracker.jobs().create_job(draft)?)
        }
        Command::Update { input, single } => {
            let update = CheckpointUpdate::from_json(&read_input(&input)?)?;
            let apply_to_group = update.applies_to_group() && !single;
            let outcome = tracker
                .coordinator()
                .apply_checkpoint_update(&update, apply_to_group)?;
            print_json(&outcome)
        }
        Command::Show { load_id } => {
            let job = tracker.jobs().get_job(&load_id)?;
            let checkpoints = tracker.jobs().checkpoints(&load_id)?;
            print_json(&JobView { job, checkpoints })
        }
        Command::List {
            status,
            group,
            origin,
            from,
            to,
            limit,
            offset,
        } => {
            let filter = JobFilter {
                status,
                dispatch_group: group,
                origin_location: origin,
                from_date: from,
                to_date: to,
                limit,
                offset,
            };
            let (jobs, total) = tracker.jobs().list_jobs(&filter)?;
            print_json(&JobList { total, jobs })
        }
        Command::Delete { load_id } => {
            tracker.jobs().delete_job(&load_id)?;
            print_json(&serde_json::json!({ "deleted": load_id }))
        }
        Command::Refresh { load_id } => {
            let status = tracker.jobs().refresh_status(&load_id)?;
            print_json(&serde_json::json!({ "load_id": load_id, "status": status }))
        }
        Command::Preview { input, origin } => {
            let record: CheckpointRecord = parse_payload(&read_input(&input)?)?;
            let status = tracker.jobs().preview_status(&record, origin.as_deref());
            print_json(&serde_json::json!({ "status": status }))
        }
        Command::Pallets { input } => {
            let update: PalletUpdate = parse_payload(&read_input(&input)?)?;
            print_json(&tracker.jobs().record_pallets(&update)?)
        }
    }
}

fn read_input(input: &str) -> anyhow::Result<String> {
    if input == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read '{}'", input))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
