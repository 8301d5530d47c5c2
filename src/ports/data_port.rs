//! Data store port trait.

use crate::domain::error::StocksError;
use crate::domain::stock::Stock;
use crate::domain::trade::Trade;

/// Read/append access to the stock catalog and the trade log.
///
/// `list_trades` returns every trade in append order, including trades
/// appended since the last `commit`. `commit` persists pending appends and
/// must succeed as a no-op when nothing is pending.
pub trait DataPort {
    fn list_stocks(&self) -> Result<Vec<Stock>, StocksError>;

    fn list_trades(&self) -> Result<Vec<Trade>, StocksError>;

    fn append_trade(&mut self, trade: Trade) -> Result<(), StocksError>;

    fn commit(&mut self) -> Result<(), StocksError>;
}

impl<T: DataPort + ?Sized> DataPort for Box<T> {
    fn list_stocks(&self) -> Result<Vec<Stock>, StocksError> {
        (**self).list_stocks()
    }

    fn list_trades(&self) -> Result<Vec<Trade>, StocksError> {
        (**self).list_trades()
    }

    fn append_trade(&mut self, trade: Trade) -> Result<(), StocksError> {
        (**self).append_trade(trade)
    }

    fn commit(&mut self) -> Result<(), StocksError> {
        (**self).commit()
    }
}
