//! CSV file data adapter.
//!
//! A store is a directory holding `stocks.csv` and `trades.csv`. Both files
//! are read once on open; `commit` appends pending trades to `trades.csv`.

use crate::domain::error::StocksError;
use crate::domain::stock::{Stock, StockClass};
use crate::domain::trade::Trade;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Utc};
use csv::StringRecord;
use rust_decimal::Decimal;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const STOCKS_FILE: &str = "stocks.csv";
pub const TRADES_FILE: &str = "trades.csv";

const STOCKS_HEADER: [&str; 5] = ["symbol", "class", "last_dividend", "fixed_dividend", "par_value"];
const TRADES_HEADER: [&str; 5] = ["symbol", "quantity", "buy", "price", "timestamp"];

pub struct CsvAdapter {
    base_path: PathBuf,
    stocks: Vec<Stock>,
    trades: Vec<Trade>,
    pending: Vec<Trade>,
}

impl CsvAdapter {
    /// Loads the catalog and trade log under `base_path`. A missing
    /// `trades.csv` is an empty log; a missing `stocks.csv` is an error.
    pub fn open(base_path: PathBuf) -> Result<Self, StocksError> {
        let stocks = read_stocks(&base_path.join(STOCKS_FILE))?;
        let trades_path = base_path.join(TRADES_FILE);
        let trades = if trades_path.exists() {
            read_trades(&trades_path)?
        } else {
            Vec::new()
        };

        tracing::debug!(
            path = %base_path.display(),
            stocks = stocks.len(),
            trades = trades.len(),
            "loaded csv store"
        );

        Ok(Self {
            base_path,
            stocks,
            trades,
            pending: Vec::new(),
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StocksError> {
        let path = config
            .get_string("csv", "path")
            .ok_or_else(|| StocksError::ConfigMissing {
                section: "csv".into(),
                key: "path".into(),
            })?;
        Self::open(PathBuf::from(path))
    }

    /// Overwrites `stocks.csv` under `base_path` with `stocks`.
    pub fn write_stocks(base_path: &Path, stocks: &[Stock]) -> Result<(), StocksError> {
        fs::create_dir_all(base_path)?;
        let path = base_path.join(STOCKS_FILE);
        let mut wtr = csv::Writer::from_path(&path).map_err(|e| csv_error(&path, e))?;

        wtr.write_record(STOCKS_HEADER)
            .map_err(|e| csv_error(&path, e))?;
        for stock in stocks {
            let fixed = stock
                .fixed_dividend
                .map(|d| d.to_string())
                .unwrap_or_default();
            wtr.write_record([
                stock.symbol.clone(),
                stock.class.to_string(),
                stock.last_dividend.to_string(),
                fixed,
                stock.par_value.to_string(),
            ])
            .map_err(|e| csv_error(&path, e))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn trades_path(&self) -> PathBuf {
        self.base_path.join(TRADES_FILE)
    }
}

impl DataPort for CsvAdapter {
    fn list_stocks(&self) -> Result<Vec<Stock>, StocksError> {
        Ok(self.stocks.clone())
    }

    fn list_trades(&self) -> Result<Vec<Trade>, StocksError> {
        Ok(self
            .trades
            .iter()
            .chain(self.pending.iter())
            .cloned()
            .collect())
    }

    fn append_trade(&mut self, trade: Trade) -> Result<(), StocksError> {
        self.pending.push(trade);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StocksError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let path = self.trades_path();
        let needs_header = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);

        // Rows are rendered in memory first so the file sees one append.
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        if needs_header {
            wtr.write_record(TRADES_HEADER)
                .map_err(|e| csv_error(&path, e))?;
        }
        for trade in &self.pending {
            wtr.write_record([
                trade.symbol.clone(),
                trade.quantity.to_string(),
                trade.buy.to_string(),
                trade.price.to_string(),
                trade.timestamp.to_rfc3339(),
            ])
            .map_err(|e| csv_error(&path, e))?;
        }
        let rows = wtr.into_inner().map_err(|e| StocksError::Database {
            reason: format!("CSV error in {}: {}", path.display(), e),
        })?;

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.write_all(&rows)?;
        file.flush()?;

        tracing::debug!(path = %path.display(), count = self.pending.len(), "committed trades");
        self.trades.append(&mut self.pending);
        Ok(())
    }
}

fn csv_error(path: &Path, e: csv::Error) -> StocksError {
    StocksError::Database {
        reason: format!("CSV error in {}: {}", path.display(), e),
    }
}

fn field<'a>(record: &'a StringRecord, index: usize, name: &str) -> Result<&'a str, StocksError> {
    record.get(index).ok_or_else(|| StocksError::Database {
        reason: format!("missing {name} column"),
    })
}

fn parse_decimal(value: &str, name: &str) -> Result<Decimal, StocksError> {
    Decimal::from_str(value.trim()).map_err(|e| StocksError::Database {
        reason: format!("invalid {name} value '{value}': {e}"),
    })
}

fn read_stocks(path: &Path) -> Result<Vec<Stock>, StocksError> {
    let content = fs::read_to_string(path).map_err(|e| StocksError::Database {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut stocks = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| csv_error(path, e))?;

        let class = StockClass::from_str(field(&record, 1, "class")?)
            .map_err(|reason| StocksError::Database { reason })?;
        let fixed = field(&record, 3, "fixed_dividend")?;
        let fixed_dividend = if fixed.trim().is_empty() {
            None
        } else {
            Some(parse_decimal(fixed, "fixed_dividend")?)
        };

        stocks.push(Stock {
            symbol: field(&record, 0, "symbol")?.trim().to_string(),
            class,
            last_dividend: parse_decimal(field(&record, 2, "last_dividend")?, "last_dividend")?,
            fixed_dividend,
            par_value: parse_decimal(field(&record, 4, "par_value")?, "par_value")?,
        });
    }

    Ok(stocks)
}

fn read_trades(path: &Path) -> Result<Vec<Trade>, StocksError> {
    let content = fs::read_to_string(path).map_err(|e| StocksError::Database {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut trades = Vec::new();

    for result in rdr.records() {
        let record = result.map_err(|e| csv_error(path, e))?;

        let quantity: i64 = field(&record, 1, "quantity")?
            .trim()
            .parse()
            .map_err(|e| StocksError::Database {
                reason: format!("invalid quantity value: {}", e),
            })?;
        let buy: bool = field(&record, 2, "buy")?
            .trim()
            .parse()
            .map_err(|e| StocksError::Database {
                reason: format!("invalid buy value: {}", e),
            })?;
        let timestamp = DateTime::parse_from_rfc3339(field(&record, 4, "timestamp")?.trim())
            .map_err(|e| StocksError::Database {
                reason: format!("invalid timestamp format: {}", e),
            })?
            .with_timezone(&Utc);

        trades.push(Trade {
            symbol: field(&record, 0, "symbol")?.trim().to_string(),
            quantity,
            buy,
            price: parse_decimal(field(&record, 3, "price")?, "price")?,
            timestamp,
        });
    }

    Ok(trades)
}
