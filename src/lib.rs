pub mod cli;
pub mod core;
pub mod providers;

pub use crate::core::config;

use crate::core::config::AppConfig;
use crate::core::{Ledger, LotUpdate, RateCache};
use crate::providers::yahoo_finance::YahooRateSource;
use anyhow::Result;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// CLI-facing operations, decoupled from argument parsing.
pub enum AppCommand {
    Summary,
    Returns {
        absolute: bool,
    },
    Alloc,
    Add {
        code: String,
        quantity: f64,
        unit_cost: f64,
        unit_current: Option<f64>,
        date: NaiveDate,
    },
    Edit {
        id: u64,
        quantity: Option<f64>,
        unit_cost: Option<f64>,
        unit_current: Option<f64>,
        date: Option<NaiveDate>,
    },
    Remove {
        id: u64,
    },
    RetrySnapshot {
        id: u64,
    },
    Import {
        file: PathBuf,
    },
    Export {
        file: PathBuf,
    },
    Prices {
        file: PathBuf,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("reel starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let base_url = config
        .providers
        .yahoo
        .as_ref()
        .map_or("https://query1.finance.yahoo.com", |p| &p.base_url);
    let source = Arc::new(YahooRateSource::new(base_url));
    let cache = RateCache::new(source, config.cache.historical_ttl(), config.cache.live_ttl());

    let ledger_path = config.ledger_path()?;
    let mut ledger = Ledger::load(&ledger_path)?;

    match command {
        AppCommand::Summary => cli::summary::run(&ledger),
        AppCommand::Returns { absolute } => {
            cli::returns::run(
                &ledger,
                &config.benchmarks,
                &cache,
                &config.composition,
                absolute,
            )
            .await
        }
        AppCommand::Alloc => cli::alloc::run(&ledger, &config.composition),
        AppCommand::Add {
            code,
            quantity,
            unit_cost,
            unit_current,
            date,
        } => {
            cli::lots::add(
                &mut ledger,
                &cache,
                &config.benchmarks,
                code,
                quantity,
                unit_cost,
                unit_current,
                date,
            )
            .await?;
            ledger.save(&ledger_path)
        }
        AppCommand::Edit {
            id,
            quantity,
            unit_cost,
            unit_current,
            date,
        } => {
            let update = LotUpdate {
                quantity,
                unit_cost,
                unit_current,
                acquisition_date: date,
            };
            cli::lots::edit(&mut ledger, &cache, &config.benchmarks, id, update).await?;
            ledger.save(&ledger_path)
        }
        AppCommand::Remove { id } => {
            cli::lots::remove(&mut ledger, id)?;
            ledger.save(&ledger_path)
        }
        AppCommand::RetrySnapshot { id } => {
            cli::lots::retry_snapshot(&mut ledger, &cache, &config.benchmarks, id).await?;
            ledger.save(&ledger_path)
        }
        AppCommand::Import { file } => {
            cli::transfer::import(&mut ledger, &file)?;
            ledger.save(&ledger_path)
        }
        AppCommand::Export { file } => cli::transfer::export(&ledger, &file),
        AppCommand::Prices { file } => {
            cli::transfer::prices(&mut ledger, &file)?;
            ledger.save(&ledger_path)
        }
    }
}
