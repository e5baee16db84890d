use analytics::{Patient, Trial};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use configuration::{Config, LoggingSettings};
use core_types::Statistic;
use database::{connect_from_env, connect_to_database};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// The main entry point for the inflammation trial tool.
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let config = configuration::load_config_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let _log_guard = init_tracing(&config.logging)?;

    // Execute the appropriate command
    let (trial, report) = match cli.command {
        Commands::Csv(args) => (load_from_csv(&args)?, args.report),
        Commands::Db(args) => (load_from_db(&args, &config).await?, args.report),
    };

    print_report(&trial, &report)
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Summary statistics and normalisation for inflammation trial data.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file. A missing file means defaults.
    #[arg(long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a trial from a comma-delimited file.
    Csv(CsvArgs),
    /// Load a trial from the `data` table of a SQLite database.
    Db(DbArgs),
}

#[derive(Parser)]
struct CsvArgs {
    /// The file to read: one patient per line, no header.
    path: PathBuf,

    /// Trial identifier. Defaults to the file name without extension.
    #[arg(long)]
    id: Option<String>,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Parser)]
struct DbArgs {
    /// The trial to load.
    #[arg(long)]
    trial_id: String,

    /// SQLite file. Overrides [database].path and DATABASE_URL.
    #[arg(long)]
    database: Option<PathBuf>,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Args)]
struct ReportArgs {
    /// Also print the statistics of the patient in this row.
    #[arg(long)]
    patient: Option<usize>,

    /// Also print the normalised matrix.
    #[arg(long)]
    normalise: bool,

    /// Emit JSON instead of tables.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn load_from_csv(args: &CsvArgs) -> Result<Trial> {
    let id = args.id.clone().unwrap_or_else(|| {
        args.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "trial".to_string())
    });

    tracing::info!(path = %args.path.display(), trial_id = %id, "Loading trial from file");
    Trial::from_csv(&args.path, id)
        .with_context(|| format!("Failed to load {}", args.path.display()))
}

async fn load_from_db(args: &DbArgs, config: &Config) -> Result<Trial> {
    let conn = match args.database.as_ref().or(config.database.path.as_ref()) {
        Some(path) => {
            tracing::info!(path = %path.display(), trial_id = %args.trial_id, "Loading trial from database");
            connect_to_database(path).await?
        }
        None => {
            tracing::info!(trial_id = %args.trial_id, "Loading trial from DATABASE_URL");
            connect_from_env().await?
        }
    };

    Trial::from_query(Some(conn), &args.trial_id, &config.columns.layout())
        .await
        .with_context(|| format!("Failed to load trial '{}'", args.trial_id))
}

fn print_report(trial: &Trial, args: &ReportArgs) -> Result<()> {
    let patient = args.patient.map(|index| trial.get_patient(index)).transpose()?;
    let normalised = if args.normalise {
        Some(trial.normalise()?)
    } else {
        None
    };

    if args.json {
        let mut doc = json!({ "summary": trial.summary()? });
        if let Some(patient) = &patient {
            doc["patient"] = json!({
                "id": patient.id(),
                "daily_mean": patient.daily_mean()?,
                "daily_max": patient.daily_max()?,
                "daily_min": patient.daily_min()?,
            });
        }
        if let Some(normalised) = &normalised {
            let rows: Vec<Vec<f64>> = normalised.rows().into_iter().map(|row| row.to_vec()).collect();
            doc["normalised"] = json!(rows);
        }
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let (patients, days) = trial.shape();
    println!("Trial {} ({} patients x {} days)", trial.id(), patients, days);

    let mut table = Table::new();
    table.set_header(day_header("statistic", days));
    for statistic in Statistic::ALL {
        let values = trial.statistic(statistic)?;
        let mut row = vec![statistic.label().to_string()];
        row.extend(values.iter().map(|&v| format_reading(v)));
        table.add_row(row);
    }
    println!("{table}");

    if let Some(patient) = &patient {
        println!("{}", patient_table(patient)?);
    }

    if let Some(normalised) = &normalised {
        let mut table = Table::new();
        table.set_header(day_header("patient", days));
        for (patient, row) in trial.patients().zip(normalised.rows()) {
            let mut cells = vec![patient.id().to_string()];
            cells.extend(row.iter().map(|&v| format_reading(v)));
            table.add_row(cells);
        }
        println!("Normalised readings");
        println!("{table}");
    }

    Ok(())
}

fn patient_table(patient: &Patient) -> Result<Table> {
    let mut table = Table::new();
    table.set_header(vec![format!("patient {}", patient.id()), "value".to_string()]);
    for statistic in Statistic::ALL {
        table.add_row(vec![
            statistic.label().to_string(),
            format_reading(patient.statistic(statistic)?),
        ]);
    }
    Ok(table)
}

fn day_header(first: &str, days: usize) -> Vec<String> {
    let mut header = vec![first.to_string()];
    header.extend((1..=days).map(|day| format!("day {day}")));
    header
}

fn format_reading(value: f64) -> String {
    format!("{value:.3}")
}

// ==============================================================================
// Logging
// ==============================================================================

/// Installs the global subscriber: console always, plus a log file when
/// configured. The returned guard must live until the program exits.
fn init_tracing(settings: &LoggingSettings) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let console = fmt::layer().with_writer(std::io::stderr);

    let Some(path) = &settings.file else {
        tracing_subscriber::registry()
            .with(filter)
            .with(console)
            .try_init()?;
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("logging.file must name a file, got {}", path.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        directory, file_name,
    ));
    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .try_init()?;

    Ok(Some(guard))
}
