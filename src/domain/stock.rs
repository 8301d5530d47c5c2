//! Stock catalog records.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockClass {
    Common,
    Preferred,
}

impl fmt::Display for StockClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockClass::Common => f.pad("Common"),
            StockClass::Preferred => f.pad("Preferred"),
        }
    }
}

impl FromStr for StockClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "common" => Ok(StockClass::Common),
            "preferred" => Ok(StockClass::Preferred),
            other => Err(format!("unknown stock class '{other}'")),
        }
    }
}

/// A listed stock. `fixed_dividend` is a percentage of par value and only
/// applies to [`StockClass::Preferred`].
#[derive(Debug, Clone, PartialEq)]
pub struct Stock {
    pub symbol: String,
    pub class: StockClass,
    pub last_dividend: Decimal,
    pub fixed_dividend: Option<Decimal>,
    pub par_value: Decimal,
}

impl Stock {
    pub fn common(symbol: &str, last_dividend: Decimal, par_value: Decimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            class: StockClass::Common,
            last_dividend,
            fixed_dividend: None,
            par_value,
        }
    }

    pub fn preferred(
        symbol: &str,
        last_dividend: Decimal,
        fixed_dividend: Option<Decimal>,
        par_value: Decimal,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            class: StockClass::Preferred,
            last_dividend,
            fixed_dividend,
            par_value,
        }
    }
}

/// Global Beverage Corporation Exchange sample catalog.
pub fn sample_stocks() -> Vec<Stock> {
    vec![
        Stock::common("TEA", dec!(0), dec!(100)),
        Stock::common("POP", dec!(8), dec!(100)),
        Stock::common("ALE", dec!(23), dec!(60)),
        Stock::preferred("GIN", dec!(8), Some(dec!(2)), dec!(100)),
        Stock::common("JOE", dec!(13), dec!(250)),
    ]
}
