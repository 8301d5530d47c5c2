//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::clock::SystemClock;
use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::memory_adapter::InMemoryDataStore;
use crate::domain::engine::StockEngine;
use crate::domain::error::StocksError;
use crate::domain::stock::sample_stocks;
use crate::ports::clock_port::Clock;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "simplestocks", about = "Stock market metrics over a trade log")]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn is_buy(self) -> bool {
        self == Side::Buy
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => f.pad("buy"),
            Side::Sell => f.pad("sell"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Engine(EngineCommand),
    /// Write the sample catalog into the configured store
    Seed,
}

/// Commands answered by the engine over an open store.
#[derive(Subcommand, Debug)]
pub enum EngineCommand {
    /// List the stock catalog
    Stocks,
    /// Dividend yield of a stock at a market price
    DividendYield {
        #[arg(long)]
        symbol: String,
        #[arg(long, allow_hyphen_values = true)]
        price: Decimal,
    },
    /// Price/earnings ratio of a stock at a market price
    PeRatio {
        #[arg(long)]
        symbol: String,
        #[arg(long, allow_hyphen_values = true)]
        price: Decimal,
    },
    /// Record a trade
    RecordTrade {
        #[arg(long)]
        symbol: String,
        #[arg(long, allow_hyphen_values = true)]
        quantity: i64,
        #[arg(long, value_enum)]
        side: Side,
        #[arg(long, allow_hyphen_values = true)]
        price: Decimal,
        /// RFC 3339 timestamp, defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Volume-weighted price over the last 15 minutes
    Vwap {
        #[arg(long)]
        symbol: String,
    },
    /// All-share index across every traded stock
    Index,
}

pub fn run(cli: Cli) -> ExitCode {
    let config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(c) => c,
            Err(code) => return code,
        },
        None => FileConfigAdapter::empty(),
    };
    init_tracing(&config);

    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }

    let result = match cli.command {
        Command::Seed => seed_store(&config).map(|n| format!("seeded {n} stocks")),
        Command::Engine(command) => build_store(&config).and_then(|store| {
            let mut engine = StockEngine::new(store, SystemClock);
            execute(&command, &mut engine)
        }),
    };

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = StocksError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// `RUST_LOG` wins over `[log] level`.
pub fn init_tracing(config: &dyn ConfigPort) {
    let level = config
        .get_string("log", "level")
        .unwrap_or_else(|| "warn".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn store_backend(config: &dyn ConfigPort) -> String {
    config
        .get_string("store", "backend")
        .map(|b| b.trim().to_lowercase())
        .unwrap_or_else(|| "memory".to_string())
}

fn unknown_backend(backend: &str) -> StocksError {
    StocksError::ConfigInvalid {
        section: "store".into(),
        key: "backend".into(),
        reason: format!("unknown backend '{backend}' (expected memory, csv or sqlite)"),
    }
}

/// Opens the store named by `[store] backend`. The memory backend starts
/// with the sample catalog and an empty trade log.
pub fn build_store(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, StocksError> {
    let backend = store_backend(config);
    tracing::debug!(%backend, "opening store");

    match backend.as_str() {
        "memory" => Ok(Box::new(InMemoryDataStore::new(sample_stocks()))),
        "csv" => Ok(Box::new(CsvAdapter::from_config(config)?)),
        "sqlite" => open_sqlite(config),
        other => Err(unknown_backend(other)),
    }
}

#[cfg(feature = "sqlite")]
fn open_sqlite(config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, StocksError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    Ok(Box::new(adapter))
}

#[cfg(not(feature = "sqlite"))]
fn open_sqlite(_config: &dyn ConfigPort) -> Result<Box<dyn DataPort>, StocksError> {
    Err(StocksError::ConfigInvalid {
        section: "store".into(),
        key: "backend".into(),
        reason: "sqlite feature is required for the sqlite backend".into(),
    })
}

/// Writes the sample catalog into the configured store and returns the
/// number of stocks written.
pub fn seed_store(config: &dyn ConfigPort) -> Result<usize, StocksError> {
    let stocks = sample_stocks();
    match store_backend(config).as_str() {
        "memory" => {
            tracing::warn!("memory backend is always seeded; nothing written");
        }
        "csv" => {
            let path = config
                .get_string("csv", "path")
                .ok_or_else(|| StocksError::ConfigMissing {
                    section: "csv".into(),
                    key: "path".into(),
                })?;
            CsvAdapter::write_stocks(&PathBuf::from(path), &stocks)?;
        }
        "sqlite" => seed_sqlite(config, &stocks)?,
        other => return Err(unknown_backend(other)),
    }
    tracing::info!(count = stocks.len(), "seeded stock catalog");
    Ok(stocks.len())
}

#[cfg(feature = "sqlite")]
fn seed_sqlite(
    config: &dyn ConfigPort,
    stocks: &[crate::domain::stock::Stock],
) -> Result<(), StocksError> {
    use crate::adapters::sqlite_adapter::SqliteAdapter;

    let adapter = SqliteAdapter::from_config(config)?;
    adapter.initialize_schema()?;
    adapter.insert_stocks(stocks)
}

#[cfg(not(feature = "sqlite"))]
fn seed_sqlite(
    config: &dyn ConfigPort,
    _stocks: &[crate::domain::stock::Stock],
) -> Result<(), StocksError> {
    open_sqlite(config).map(|_| ())
}

/// Runs one engine command and renders its result for stdout.
pub fn execute<D: DataPort, C: Clock>(
    command: &EngineCommand,
    engine: &mut StockEngine<D, C>,
) -> Result<String, StocksError> {
    match command {
        EngineCommand::Stocks => {
            let stocks = engine.data().list_stocks()?;
            let lines: Vec<String> = stocks
                .iter()
                .map(|s| {
                    let fixed = s
                        .fixed_dividend
                        .map(|d| format!("{d}%"))
                        .unwrap_or_else(|| "-".to_string());
                    format!(
                        "{:<6} {:<10} last_dividend={} fixed_dividend={} par_value={}",
                        s.symbol, s.class, s.last_dividend, fixed, s.par_value
                    )
                })
                .collect();
            Ok(lines.join("\n"))
        }
        EngineCommand::DividendYield { symbol, price } => {
            let stock = engine.find_stock(symbol)?;
            let value = engine.dividend_yield(&stock, *price)?;
            Ok(value.normalize().to_string())
        }
        EngineCommand::PeRatio { symbol, price } => {
            let stock = engine.find_stock(symbol)?;
            let value = engine.price_earnings_ratio(&stock, *price)?;
            Ok(value.normalize().to_string())
        }
        EngineCommand::RecordTrade {
            symbol,
            quantity,
            side,
            price,
            at,
        } => {
            let timestamp = at.unwrap_or_else(|| engine.clock().now());
            engine.record_trade(symbol, *quantity, side.is_buy(), *price, timestamp)?;
            tracing::info!(%symbol, quantity, %side, %price, "recorded trade");
            Ok(format!(
                "recorded {} {} {} @ {} at {}",
                side,
                quantity,
                symbol,
                price,
                timestamp.to_rfc3339()
            ))
        }
        EngineCommand::Vwap { symbol } => {
            let value = engine.volume_weighted_price(symbol)?;
            Ok(value.normalize().to_string())
        }
        EngineCommand::Index => {
            let value = engine.all_share_index()?;
            Ok(value.normalize().to_string())
        }
    }
}
