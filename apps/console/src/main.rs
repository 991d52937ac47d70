//! # Almacén Console Entry Point
//!
//! ```text
//! almacen [--config PATH] dashboard [--top N]
//! almacen [--config PATH] export <collection> [--format pdf|sheet|csv]
//! almacen [--config PATH] init-config
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Resolve configuration (defaults → TOML → environment)
//! 3. Build the console (one synchronizer per collection)
//! 4. Run the subcommand

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use almacen_report::export::{ExportKind, ExportOptions, ReportExporter};
use almacen_report::schema::{self, Schema};
use almacen_sync::config::ExportConfig;
use almacen_sync::{Console, ConsoleConfig, Endpoint, ResourceSync};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;

use error::AppError;

#[derive(Debug, Parser)]
#[command(name = "almacen", version, about = "Almacén retail console")]
struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print inventory, supplier and sales metrics as JSON
    Dashboard {
        /// Products listed by inventory value
        #[arg(long, default_value_t = almacen_core::aggregation::DEFAULT_TOP_N)]
        top: usize,
    },
    /// Export a collection report
    Export {
        collection: Collection,

        #[arg(long, value_enum, default_value_t = Format::Pdf)]
        format: Format,
    },
    /// Write the resolved configuration to the config file
    InitConfig,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Collection {
    Categories,
    Clients,
    Suppliers,
    Products,
    Sales,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Pdf,
    Sheet,
    Csv,
}

impl From<Format> for ExportKind {
    fn from(format: Format) -> Self {
        match format {
            Format::Pdf => ExportKind::Pdf,
            Format::Sheet => ExportKind::Workbook,
            Format::Csv => ExportKind::Csv,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    // An explicit path must load; the default location may be absent or broken.
    let config = match cli.config.clone() {
        Some(path) => ConsoleConfig::load(Some(path))?,
        None => ConsoleConfig::load_or_default(None),
    };

    if let Command::InitConfig = cli.command {
        let path = config.save(cli.config)?;
        println!("{}", path.display());
        return Ok(());
    }

    let config = Arc::new(config);
    let console = Console::connect(Arc::clone(&config))?;

    match cli.command {
        Command::Dashboard { top } => {
            console.load_dashboard_sources().await?;
            let dashboard = console.dashboard_top(top).await;
            let json = serde_json::to_string_pretty(&dashboard)
                .map_err(|e| AppError::new(error::ErrorCode::ExportError, e.to_string()))?;
            println!("{}", json);
        }
        Command::Export { collection, format } => {
            let exporter = ReportExporter::new(export_options(&config.export));
            let kind = ExportKind::from(format);
            let path = match collection {
                Collection::Categories => export(&console.categories, schema::categories(), &exporter, kind).await?,
                Collection::Clients => export(&console.clients, schema::clients(), &exporter, kind).await?,
                Collection::Suppliers => export(&console.suppliers, schema::suppliers(), &exporter, kind).await?,
                Collection::Products => export(&console.products, schema::products(), &exporter, kind).await?,
                Collection::Sales => export(&console.sales, schema::sales(), &exporter, kind).await?,
            };
            println!("{}", path.display());
        }
        Command::InitConfig => {}
    }

    Ok(())
}

async fn export<T: Endpoint>(
    sync: &ResourceSync<T>,
    schema: Schema<T>,
    exporter: &ReportExporter,
    kind: ExportKind,
) -> Result<PathBuf, AppError> {
    sync.load().await?;
    let rows = sync.snapshot().await;
    info!(collection = sync.collection(), rows = rows.len(), "Exporting");
    Ok(exporter.export(&schema, &rows, kind, Utc::now())?)
}

fn export_options(config: &ExportConfig) -> ExportOptions {
    ExportOptions {
        output_dir: config.output_dir.clone(),
        company_name: config.company_name.clone(),
        branding_image: config.branding_image.clone(),
        rows_per_batch: config.rows_per_batch,
        ..Default::default()
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=almacen_sync=trace` - Trace the synchronizers only
/// - Default: INFO, debug for almacen crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,almacen=debug,reqwest=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
