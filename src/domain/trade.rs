//! Trade log records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// A single buy or sell of `quantity` shares of the stock named by `symbol`.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub symbol: String,
    pub quantity: i64,
    pub buy: bool,
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Trade {
    /// price * quantity, `None` on overflow.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}
