use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;

use shopforge_core::{CoreError, Settings, TableName};
use shopforge_generate::{GenerationConfig, GenerationError, GenerationPipeline, MemorySink};
use shopforge_stage::{
    DataValidator, IngestPipeline, OutputFormat, PgSource, StageError, StagingLayer,
};
use shopforge_store::{PgSink, StoreError};

mod logging;
mod settings;

use settings::SettingsArgs;

#[derive(Debug, Error)]
enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("staging error: {0}")]
    Stage(#[from] StageError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("logging setup failed: {0}")]
    Logging(String),
    #[error("export failed: {0}")]
    ExportFailed(String),
    #[error("validation failed for partition {0}")]
    ValidationFailed(NaiveDate),
}

#[derive(Parser, Debug)]
#[command(name = "shopforge", version, about = "Synthetic ecommerce data and staging export")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Also write NDJSON events to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    settings: SettingsArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the synthetic dataset into the source database.
    Generate(GenerateArgs),
    /// Export source tables into a dated staging partition.
    Export(ExportArgs),
    /// Validate an existing staging partition against the source.
    Validate(ValidateArgs),
    /// Print the resolved settings with secrets masked.
    Settings,
    /// Print the JSON Schema of the generation config file.
    ConfigSchema,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// TOML generation config; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the config seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Create the ecommerce schema and tables if missing.
    #[arg(long, default_value_t = false)]
    init_schema: bool,
    /// Truncate every table and restart identities before loading.
    #[arg(long, default_value_t = false)]
    reset: bool,
    /// Generate into memory and print the report without a database.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    /// Override the config insert batch size.
    #[arg(long)]
    batch_size: Option<usize>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Table to export; repeat for several. Defaults to every table.
    #[arg(long = "table")]
    tables: Vec<TableName>,
    #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
    format: FormatArg,
    /// Partition date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Validate the partition after a successful export.
    #[arg(long, default_value_t = false)]
    validate: bool,
    /// Staging root; defaults to STAGING_PATH.
    #[arg(long)]
    staging_path: Option<PathBuf>,
    /// Rows compared per table when validating.
    #[arg(long, default_value_t = 5)]
    sample: usize,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Partition date (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Staging root; defaults to STAGING_PATH.
    #[arg(long)]
    staging_path: Option<PathBuf>,
    /// Table to validate; repeat for several. Defaults to every table.
    #[arg(long = "table")]
    tables: Vec<TableName>,
    /// Rows compared per table; 0 skips sampling.
    #[arg(long, default_value_t = 5)]
    sample: usize,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Csv,
    Parquet,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Csv => OutputFormat::Csv,
            FormatArg::Parquet => OutputFormat::Parquet,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = cli.settings.to_settings();
    logging::init_logging(settings.debug, cli.log_file.as_deref())?;

    match cli.command {
        Command::Generate(args) => run_generate(&settings, args).await,
        Command::Export(args) => run_export(&settings, args).await,
        Command::Validate(args) => run_validate(&settings, args).await,
        Command::Settings => print_settings(&settings),
        Command::ConfigSchema => {
            let schema = schemars::schema_for!(GenerationConfig);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
    }
}

async fn run_generate(settings: &Settings, args: GenerateArgs) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => GenerationConfig::load(path)?,
        None => GenerationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(batch_size) = args.batch_size {
        config.insert_batch_size = batch_size;
    }
    let pipeline = GenerationPipeline::new(config)?;

    if args.dry_run {
        let mut sink = MemorySink::new();
        let report = pipeline.run(&mut sink).await?;
        tracing::info!(
            event = "dry_run_finished",
            rows = report.total_rows(),
            duration_ms = report.duration_ms
        );
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let pool = shopforge_store::connect(&settings.source.url()?).await?;
    if args.init_schema {
        shopforge_store::ensure_schema(&pool).await?;
    }
    if args.reset {
        shopforge_store::reset(&pool).await?;
    }

    let mut sink = PgSink::new(pool.clone()).with_batch_size(pipeline.config().insert_batch_size);
    let report = pipeline.run(&mut sink).await?;

    for (table, rows) in shopforge_store::table_counts(&pool).await? {
        tracing::info!(event = "table_count", table = %table, rows);
    }
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_export(settings: &Settings, args: ExportArgs) -> Result<(), CliError> {
    let url = settings.source.url()?;
    let pool = shopforge_store::connect(&url).await?;
    let source = PgSource::new(pool, &url);

    let date = args.date.unwrap_or_else(today);
    let root = args
        .staging_path
        .unwrap_or_else(|| settings.staging_path.clone());
    let staging = StagingLayer::new(root, date);

    let summary = IngestPipeline::new(&source, staging.clone())
        .with_tables(args.tables.clone())
        .with_format(args.format.into())
        .run()
        .await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    if !summary.success {
        return Err(CliError::ExportFailed(
            summary
                .error
                .unwrap_or_else(|| "one or more tables failed".to_string()),
        ));
    }

    if args.validate {
        let tables = selected(&args.tables);
        let report = DataValidator::new(&source, &staging)
            .validate(&tables, args.sample)
            .await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        if !report.passed() {
            return Err(CliError::ValidationFailed(date));
        }
    }
    Ok(())
}

async fn run_validate(settings: &Settings, args: ValidateArgs) -> Result<(), CliError> {
    let url = settings.source.url()?;
    let pool = shopforge_store::connect(&url).await?;
    let source = PgSource::new(pool, &url);

    let date = args.date.unwrap_or_else(today);
    let root = args
        .staging_path
        .unwrap_or_else(|| settings.staging_path.clone());
    let staging = StagingLayer::new(root, date);

    let tables = selected(&args.tables);
    let report = DataValidator::new(&source, &staging)
        .validate(&tables, args.sample)
        .await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.passed() {
        Ok(())
    } else {
        Err(CliError::ValidationFailed(date))
    }
}

fn print_settings(settings: &Settings) -> Result<(), CliError> {
    let value = serde_json::json!({
        "settings": settings,
        "source_connection": settings.source.redacted()?,
        "warehouse_connection": settings.warehouse.redacted()?,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn selected(tables: &[TableName]) -> Vec<TableName> {
    if tables.is_empty() {
        TableName::ALL.to_vec()
    } else {
        tables.to_vec()
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
