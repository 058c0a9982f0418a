use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use employee_etl::config::Config;
use employee_etl::constants::{DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use employee_etl::db::SqliteStore;
use employee_etl::job::{EtlJob, JobReport};
use employee_etl::logging;
use employee_etl::observability;
use employee_etl::pipeline::{CleaningPipeline, CleaningReport};
use employee_etl::source::CsvSource;

#[derive(Parser)]
#[command(name = "employee_etl")]
#[command(about = "Clean, normalize and impute employee records")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to config.toml (falls back to EMPLOYEE_ETL_CONFIG, then ./config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the job report as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the source CSV into the staging table
    Load,
    /// Clean the staging table into the clean table
    Clean,
    /// Run load followed by clean
    Run,
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .or_else(|| std::env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn print_cleaning(report: &CleaningReport) {
    println!("\n📊 Cleaning Results:");
    println!("   Input rows: {}", report.input_rows);
    println!("   Duplicates dropped: {}", report.duplicates_dropped);
    println!("   Output rows: {}", report.output_rows);
    println!("   Unparseable dates: {}", report.unparseable_dates);
    for (field, outcome) in [("Experience", &report.experience), ("Rating", &report.rating)] {
        println!(
            "   {} imputed: {} predicted, {} defaulted ({} training rows)",
            field, outcome.predicted, outcome.defaulted, outcome.training_rows
        );
        if let Some(reason) = &outcome.skipped {
            println!("   ⚠️  {} model skipped: {}", field, reason);
        }
    }
    println!("   Output digest: {}", report.output_digest);
}

fn print_report(report: &JobReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report).context("Failed to serialize job report")?);
        return Ok(());
    }
    if let Some(rows) = report.staged_rows {
        println!("📥 Staged {} rows", rows);
    }
    if let Some(cleaning) = &report.cleaning {
        print_cleaning(cleaning);
    }
    println!("✅ Run {} completed successfully", report.run_id);
    Ok(())
}

fn execute(cli: &Cli, config: &Config) -> Result<JobReport> {
    let job = EtlJob::new(CleaningPipeline::new(config.imputation.forest_params()));
    let source = CsvSource::new(&config.source.csv_path);
    let mut store = SqliteStore::open(
        &config.storage.database_path,
        &config.storage.staging_table,
        &config.storage.clean_table,
    )
    .with_context(|| format!("Failed to open database {}", config.storage.database_path.display()))?;
    info!(
        staging = store.staging_table(),
        clean = store.clean_table(),
        "Using employee tables"
    );

    let mut report = JobReport {
        run_id: job.run_id(),
        staged_rows: None,
        cleaning: None,
    };

    match cli.command {
        Commands::Load => {
            let staged = job
                .load_staging(&source, &mut store)
                .with_context(|| format!("Failed to load {}", source.path().display()))?;
            report.staged_rows = Some(staged);
        }
        Commands::Clean => {
            let cleaning = job.clean(&mut store).context("Failed to clean staging table")?;
            report.cleaning = Some(cleaning);
        }
        Commands::Run => {
            report = job
                .run(&source, &mut store)
                .with_context(|| format!("Failed to run job for {}", source.path().display()))?;
        }
    }
    Ok(report)
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();
    let path = config_path(&cli);
    let config = Config::load(&path).with_context(|| format!("Failed to load config {}", path.display()))?;
    info!(config = %path.display(), "Configuration loaded");

    let metrics_handle = match &config.metrics.textfile {
        Some(_) => Some(observability::install_recorder().context("Failed to install metrics recorder")?),
        None => None,
    };

    let outcome = execute(&cli, &config);

    if let (Some(handle), Some(textfile)) = (&metrics_handle, &config.metrics.textfile) {
        observability::write_textfile(handle, textfile)
            .with_context(|| format!("Failed to write metrics to {}", textfile.display()))?;
    }

    match outcome {
        Ok(report) => print_report(&report, cli.json),
        Err(e) => {
            error!("Job failed: {:#}", e);
            println!("❌ Job failed: {:#}", e);
            Err(e)
        }
    }
}
