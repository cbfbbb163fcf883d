use anyhow::Result;
use chrono::NaiveDate;
use clap::{CommandFactory, Parser, Subcommand};
use reel::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display nominal portfolio valuation
    Summary,
    /// Display real returns against the configured benchmarks
    Returns {
        /// Show purchasing-power deltas in benchmark units instead of percentages
        #[arg(short, long)]
        absolute: bool,
    },
    /// Display look-through asset exposure
    Alloc,
    /// Add a purchase lot to the ledger
    Add {
        /// Instrument code, e.g. AFT
        code: String,
        /// Units purchased
        quantity: f64,
        /// Price paid per unit (TL)
        unit_cost: f64,
        /// Purchase date (YYYY-MM-DD)
        date: NaiveDate,
        /// Latest known price per unit (TL); defaults to the unit cost
        #[arg(short = 'p', long)]
        unit_current: Option<f64>,
    },
    /// Edit fields of an existing lot
    Edit {
        /// Lot id (see `summary`)
        id: u64,
        #[arg(short, long)]
        quantity: Option<f64>,
        #[arg(long)]
        unit_cost: Option<f64>,
        #[arg(short = 'p', long)]
        unit_current: Option<f64>,
        /// New purchase date; triggers a snapshot refetch
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Remove a lot by id
    Remove { id: u64 },
    /// Refetch acquisition rates for a lot whose snapshot failed
    RetrySnapshot { id: u64 },
    /// Replace the ledger with an exported file
    Import { file: PathBuf },
    /// Write the ledger to a file
    Export { file: PathBuf },
    /// Bulk-update current prices from a code,price CSV
    Prices { file: PathBuf },
}

impl From<Commands> for reel::AppCommand {
    fn from(cmd: Commands) -> reel::AppCommand {
        match cmd {
            Commands::Summary => reel::AppCommand::Summary,
            Commands::Returns { absolute } => reel::AppCommand::Returns { absolute },
            Commands::Alloc => reel::AppCommand::Alloc,
            Commands::Add {
                code,
                quantity,
                unit_cost,
                date,
                unit_current,
            } => reel::AppCommand::Add {
                code,
                quantity,
                unit_cost,
                unit_current,
                date,
            },
            Commands::Edit {
                id,
                quantity,
                unit_cost,
                unit_current,
                date,
            } => reel::AppCommand::Edit {
                id,
                quantity,
                unit_cost,
                unit_current,
                date,
            },
            Commands::Remove { id } => reel::AppCommand::Remove { id },
            Commands::RetrySnapshot { id } => reel::AppCommand::RetrySnapshot { id },
            Commands::Import { file } => reel::AppCommand::Import { file },
            Commands::Export { file } => reel::AppCommand::Export { file },
            Commands::Prices { file } => reel::AppCommand::Prices { file },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => reel::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

fn setup() -> anyhow::Result<()> {
    use anyhow::Context;

    let path = reel::config::AppConfig::default_config_path()?;

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
benchmarks:
  - id: usd
    unit: "$"
    kind: currency
    ticker: "USDTRY=X"
  - id: gold
    unit: gr
    kind: gold_gram
    spot_ticker: "XAUUSD=X"
    fx_ticker: "USDTRY=X"
  - id: inflation
    unit: TL
    kind: inflation
    monthly_rate: 0.03

composition:
  version: 1
  codes: {}

providers:
  yahoo:
    base_url: "https://query1.finance.yahoo.com"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
