//! Stock metric calculations and trade recording.
//!
//! The engine keeps no state of its own: every call re-reads the catalog and
//! trade log from the injected [`DataPort`] and reads "now" from the injected
//! [`Clock`].

use crate::domain::error::StocksError;
use crate::domain::stock::{Stock, StockClass};
use crate::domain::trade::Trade;
use crate::ports::clock_port::Clock;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

/// Trailing window used by [`StockEngine::volume_weighted_price`].
pub const VWAP_WINDOW_MINUTES: i64 = 15;

pub struct StockEngine<D, C> {
    data: D,
    clock: C,
}

impl<D: DataPort, C: Clock> StockEngine<D, C> {
    pub fn new(data: D, clock: C) -> Self {
        Self { data, clock }
    }

    pub fn data(&self) -> &D {
        &self.data
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Exact-symbol lookup in the current catalog.
    pub fn find_stock(&self, symbol: &str) -> Result<Stock, StocksError> {
        self.data
            .list_stocks()?
            .into_iter()
            .find(|s| s.symbol == symbol)
            .ok_or_else(|| StocksError::NotFound {
                symbol: symbol.to_string(),
            })
    }

    /// Common: last_dividend / price.
    /// Preferred: (fixed_dividend% * par_value) / price.
    pub fn dividend_yield(
        &self,
        stock: &Stock,
        market_price: Decimal,
    ) -> Result<Decimal, StocksError> {
        if market_price.is_zero() {
            return Err(StocksError::invalid_input(
                "cannot calculate dividend yield when market price is zero",
            ));
        }

        match stock.class {
            StockClass::Preferred => {
                let fixed = stock.fixed_dividend.ok_or_else(|| {
                    StocksError::invalid_input(format!(
                        "preferred stock {} has no fixed dividend",
                        stock.symbol
                    ))
                })?;
                fixed
                    .checked_mul(dec!(0.01))
                    .and_then(|pct| pct.checked_mul(stock.par_value))
                    .and_then(|income| income.checked_div(market_price))
                    .ok_or_else(|| overflow("dividend yield", &stock.symbol))
            }
            StockClass::Common => stock
                .last_dividend
                .checked_div(market_price)
                .ok_or_else(|| overflow("dividend yield", &stock.symbol)),
        }
    }

    /// price / last_dividend
    pub fn price_earnings_ratio(
        &self,
        stock: &Stock,
        market_price: Decimal,
    ) -> Result<Decimal, StocksError> {
        if stock.last_dividend.is_zero() {
            return Err(StocksError::invalid_input(format!(
                "cannot calculate price-earnings ratio for {}: last dividend is zero",
                stock.symbol
            )));
        }
        market_price
            .checked_div(stock.last_dividend)
            .ok_or_else(|| overflow("price-earnings ratio", &stock.symbol))
    }

    /// Appends a trade for a catalogued stock and commits it. Nothing is
    /// appended or committed when the symbol is unknown.
    pub fn record_trade(
        &mut self,
        symbol: &str,
        quantity: i64,
        buy: bool,
        price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StocksError> {
        let stock = self.find_stock(symbol)?;

        self.data.append_trade(Trade {
            symbol: stock.symbol,
            quantity,
            buy,
            price,
            timestamp,
        })?;
        self.data.commit()
    }

    /// Σ(price * quantity) / Σ(quantity) over trades for `symbol` with a
    /// timestamp in `[now - 15m, now]`.
    pub fn volume_weighted_price(&self, symbol: &str) -> Result<Decimal, StocksError> {
        let now = self.clock.now();
        let cutoff = now - Duration::minutes(VWAP_WINDOW_MINUTES);

        let trades: Vec<Trade> = self
            .data
            .list_trades()?
            .into_iter()
            .filter(|t| t.symbol == symbol && t.timestamp >= cutoff && t.timestamp <= now)
            .collect();

        if trades.is_empty() {
            return Err(StocksError::no_data(format!(
                "no trades for {symbol} in the last {VWAP_WINDOW_MINUTES} minutes"
            )));
        }

        let total_quantity = trades
            .iter()
            .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(Decimal::from(t.quantity)))
            .ok_or_else(|| overflow("total traded quantity", symbol))?;
        if total_quantity.is_zero() {
            return Err(StocksError::invalid_input(format!(
                "total traded quantity for {symbol} in the window is zero"
            )));
        }

        trades
            .iter()
            .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.notional()?))
            .and_then(|notional| notional.checked_div(total_quantity))
            .ok_or_else(|| overflow("volume weighted price", symbol))
    }

    /// Geometric mean of the latest trade price of every traded stock.
    ///
    /// When several trades of one stock share the latest timestamp, the one
    /// appended last wins.
    pub fn all_share_index(&self) -> Result<Decimal, StocksError> {
        let trades = self.data.list_trades()?;

        let mut latest: BTreeMap<&str, &Trade> = BTreeMap::new();
        for trade in &trades {
            latest
                .entry(trade.symbol.as_str())
                .and_modify(|current| {
                    if trade.timestamp >= current.timestamp {
                        *current = trade;
                    }
                })
                .or_insert(trade);
        }

        if latest.is_empty() {
            return Err(StocksError::no_data(
                "no trades with which to calculate the all share index",
            ));
        }

        let product = latest
            .values()
            .try_fold(Decimal::ONE, |acc, t| acc.checked_mul(t.price))
            .ok_or_else(|| StocksError::invalid_input("product of latest prices overflows"))?;

        let n = latest.len() as f64;
        let root = product
            .to_f64()
            .map(|p| p.powf(1.0 / n))
            .and_then(Decimal::from_f64)
            .ok_or_else(|| {
                StocksError::invalid_input(format!(
                    "geometric mean of {product} over {} stocks is not a finite number",
                    latest.len()
                ))
            })?;

        Ok(root)
    }
}

fn overflow(what: &str, symbol: &str) -> StocksError {
    StocksError::invalid_input(format!("{what} for {symbol} overflows"))
}
