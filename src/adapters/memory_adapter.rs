//! In-memory data store.

use crate::domain::error::StocksError;
use crate::domain::stock::Stock;
use crate::domain::trade::Trade;
use crate::ports::data_port::DataPort;

/// Vec-backed store. Commits have nothing to persist; they are counted so
/// callers can observe them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataStore {
    stocks: Vec<Stock>,
    trades: Vec<Trade>,
    pending: usize,
    commits: usize,
}

impl InMemoryDataStore {
    pub fn new(stocks: Vec<Stock>) -> Self {
        Self {
            stocks,
            ..Self::default()
        }
    }

    /// Number of successful `commit` calls.
    pub fn commit_count(&self) -> usize {
        self.commits
    }

    /// Trades appended since the last commit.
    pub fn pending(&self) -> usize {
        self.pending
    }
}

impl DataPort for InMemoryDataStore {
    fn list_stocks(&self) -> Result<Vec<Stock>, StocksError> {
        Ok(self.stocks.clone())
    }

    fn list_trades(&self) -> Result<Vec<Trade>, StocksError> {
        Ok(self.trades.clone())
    }

    fn append_trade(&mut self, trade: Trade) -> Result<(), StocksError> {
        self.trades.push(trade);
        self.pending += 1;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StocksError> {
        tracing::debug!(pending = self.pending, "committing in-memory trades");
        self.pending = 0;
        self.commits += 1;
        Ok(())
    }
}
