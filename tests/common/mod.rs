#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use simplestocks::domain::error::StocksError;
pub use simplestocks::domain::stock::{sample_stocks, Stock};
pub use simplestocks::domain::trade::Trade;
use simplestocks::ports::clock_port::Clock;
use simplestocks::ports::data_port::DataPort;
use std::cell::Cell;

/// Records every append and commit so tests can check the store contract.
pub struct MockDataPort {
    pub stocks: Vec<Stock>,
    pub trades: Vec<Trade>,
    pub appends: usize,
    pub commits: usize,
    pub commit_error: Option<String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            stocks: sample_stocks(),
            trades: Vec::new(),
            appends: 0,
            commits: 0,
            commit_error: None,
        }
    }

    pub fn with_trades(mut self, trades: Vec<Trade>) -> Self {
        self.trades.extend(trades);
        self
    }

    pub fn with_commit_error(mut self, reason: &str) -> Self {
        self.commit_error = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn list_stocks(&self) -> Result<Vec<Stock>, StocksError> {
        Ok(self.stocks.clone())
    }

    fn list_trades(&self) -> Result<Vec<Trade>, StocksError> {
        Ok(self.trades.clone())
    }

    fn append_trade(&mut self, trade: Trade) -> Result<(), StocksError> {
        self.appends += 1;
        self.trades.push(trade);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StocksError> {
        if let Some(reason) = &self.commit_error {
            return Err(StocksError::Database {
                reason: reason.clone(),
            });
        }
        self.commits += 1;
        Ok(())
    }
}

/// Fixed instant that counts how often it is read.
pub struct CountingClock {
    pub at: DateTime<Utc>,
    pub reads: Cell<usize>,
}

impl CountingClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            at,
            reads: Cell::new(0),
        }
    }
}

impl Clock for CountingClock {
    fn now(&self) -> DateTime<Utc> {
        self.reads.set(self.reads.get() + 1);
        self.at
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 14, 30, 0).unwrap()
}

pub fn make_trade(
    symbol: &str,
    buy: bool,
    price: Decimal,
    quantity: i64,
    offset: Duration,
) -> Trade {
    Trade {
        symbol: symbol.to_string(),
        quantity,
        buy,
        price,
        timestamp: now() + offset,
    }
}

pub fn minutes(m: i64) -> Duration {
    Duration::minutes(m)
}
