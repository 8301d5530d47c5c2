//! SQLite data adapter.

use crate::domain::error::StocksError;
use crate::domain::stock::{Stock, StockClass};
use crate::domain::trade::Trade;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use rust_decimal::Decimal;
use std::str::FromStr;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
    pending: Vec<Trade>,
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, StocksError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| StocksError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = u32::try_from(config.get_int("sqlite", "pool_size", 4))
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| StocksError::ConfigInvalid {
                section: "sqlite".into(),
                key: "pool_size".into(),
                reason: "must be between 1 and 4294967295".into(),
            })?;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| StocksError::Database {
                    reason: e.to_string(),
                })?;

        tracing::debug!(path = %db_path, pool_size, "opened sqlite store");
        Ok(Self {
            pool,
            pending: Vec::new(),
        })
    }

    pub fn in_memory() -> Result<Self, StocksError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| StocksError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self {
            pool,
            pending: Vec::new(),
        })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StocksError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| StocksError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), StocksError> {
        let conn = self.conn()?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS stocks (
                symbol TEXT PRIMARY KEY,
                class TEXT NOT NULL,
                last_dividend TEXT NOT NULL,
                fixed_dividend TEXT,
                par_value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL REFERENCES stocks(symbol),
                quantity INTEGER NOT NULL,
                buy INTEGER NOT NULL,
                price TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trades_symbol ON trades(symbol);",
        )
        .map_err(query_error)?;

        Ok(())
    }

    pub fn insert_stocks(&self, stocks: &[Stock]) -> Result<(), StocksError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for stock in stocks {
            tx.execute(
                "INSERT OR REPLACE INTO stocks (symbol, class, last_dividend, fixed_dividend, par_value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    stock.symbol,
                    stock.class.to_string(),
                    stock.last_dividend.to_string(),
                    stock.fixed_dividend.map(|d| d.to_string()),
                    stock.par_value.to_string(),
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(())
    }
}

fn query_error(e: rusqlite::Error) -> StocksError {
    StocksError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn conversion_error<E>(column: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn decimal_column(row: &rusqlite::Row<'_>, column: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(column)?;
    Decimal::from_str(&text).map_err(|e| conversion_error(column, e))
}

impl DataPort for SqliteAdapter {
    fn list_stocks(&self) -> Result<Vec<Stock>, StocksError> {
        let conn = self.conn()?;

        let query = "SELECT symbol, class, last_dividend, fixed_dividend, par_value
                     FROM stocks
                     ORDER BY rowid";

        let mut stmt = conn.prepare(query).map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| {
                let class_str: String = row.get(1)?;
                let class = StockClass::from_str(&class_str).map_err(|reason| {
                    conversion_error(1, std::io::Error::new(std::io::ErrorKind::InvalidData, reason))
                })?;
                let fixed: Option<String> = row.get(3)?;
                let fixed_dividend = fixed
                    .map(|f| Decimal::from_str(&f).map_err(|e| conversion_error(3, e)))
                    .transpose()?;
                Ok(Stock {
                    symbol: row.get(0)?,
                    class,
                    last_dividend: decimal_column(row, 2)?,
                    fixed_dividend,
                    par_value: decimal_column(row, 4)?,
                })
            })
            .map_err(query_error)?;

        let mut stocks = Vec::new();
        for row in rows {
            stocks.push(row.map_err(query_error)?);
        }

        Ok(stocks)
    }

    fn list_trades(&self) -> Result<Vec<Trade>, StocksError> {
        let conn = self.conn()?;

        let query = "SELECT symbol, quantity, buy, price, timestamp
                     FROM trades
                     ORDER BY id ASC";

        let mut stmt = conn.prepare(query).map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| {
                let ts_str: String = row.get(4)?;
                let timestamp = DateTime::parse_from_rfc3339(&ts_str)
                    .map_err(|e| conversion_error(4, e))?
                    .with_timezone(&Utc);
                Ok(Trade {
                    symbol: row.get(0)?,
                    quantity: row.get(1)?,
                    buy: row.get(2)?,
                    price: decimal_column(row, 3)?,
                    timestamp,
                })
            })
            .map_err(query_error)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_error)?);
        }
        trades.extend(self.pending.iter().cloned());

        Ok(trades)
    }

    fn append_trade(&mut self, trade: Trade) -> Result<(), StocksError> {
        self.pending.push(trade);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StocksError> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for trade in &self.pending {
            tx.execute(
                "INSERT INTO trades (symbol, quantity, buy, price, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    trade.symbol,
                    trade.quantity,
                    trade.buy,
                    trade.price.to_string(),
                    trade.timestamp.to_rfc3339(),
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;

        tracing::debug!(count = self.pending.len(), "committed trades to sqlite");
        self.pending.clear();
        Ok(())
    }
}
