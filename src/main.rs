use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use driftcmp::catalog::ServiceCatalog;
use driftcmp::compare::compare_accounts;
use driftcmp::config::ComparisonConfig;
use driftcmp::output::{self, OutputFormat};
use driftcmp::snapshot::AccountSnapshot;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Version injected at compile time via DRIFTCMP_VERSION env var (set by
/// CI/CD), or "dev" for local builds.
pub const VERSION: &str = match option_env!("DRIFTCMP_VERSION") {
    Some(v) => v,
    None => "dev",
};

/// Compare cloud resources across two account snapshots
#[derive(Parser, Debug)]
#[command(name = "driftcmp", version, about, long_about = None)]
struct Args {
    /// Snapshot file for the first account
    #[arg(long, value_name = "FILE")]
    account1: PathBuf,

    /// Snapshot file for the second account
    #[arg(long, value_name = "FILE")]
    account2: PathBuf,

    /// Services to compare (default: all known services)
    #[arg(long, value_delimiter = ',')]
    services: Vec<String>,

    /// Comparison settings file (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    output_file: Option<PathBuf>,

    /// Exit with status 1 when any change is found
    #[arg(long)]
    fail_on_changes: bool,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok()?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("driftcmp started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("driftcmp").join("driftcmp.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".driftcmp").join("driftcmp.log");
    }
    PathBuf::from("driftcmp.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = setup_logging(args.log_level);

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    let config = match &args.config {
        Some(path) => ComparisonConfig::load(path)?,
        None => ComparisonConfig::default(),
    };

    let catalog = ServiceCatalog::builtin();
    let services: Vec<String> = if args.services.is_empty() {
        catalog.list_services().iter().map(|s| s.to_string()).collect()
    } else {
        let (valid, invalid) = catalog.partition_services(&args.services);
        if !invalid.is_empty() {
            bail!(
                "Unknown services: {}. Known services: {}",
                invalid.join(", "),
                catalog.list_services().join(", ")
            );
        }
        valid.iter().map(|s| s.to_string()).collect()
    };

    let snapshot1 = AccountSnapshot::load(&args.account1)?;
    let snapshot2 = AccountSnapshot::load(&args.account2)?;
    if snapshot1.account_id == snapshot2.account_id {
        bail!(
            "Both snapshots are from account {}; nothing to compare",
            snapshot1.account_id
        );
    }

    let report = compare_accounts(
        &snapshot1,
        &snapshot2,
        &services,
        catalog,
        Arc::new(config),
    )
    .await;

    match &args.output_file {
        Some(path) => {
            output::write_to_file(&report, args.output, path)?;
            eprintln!("Report written to {}", path.display());
        }
        None => {
            let rendered = output::render(&report, args.output)?;
            print!("{rendered}");
        }
    }

    if report.has_errors() {
        Ok(ExitCode::from(2))
    } else if args.fail_on_changes && report.summary.total_changes > 0 {
        Ok(ExitCode::from(1))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
