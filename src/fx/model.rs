use std::fmt::Display;

use rust_decimal::Decimal;
use time::Date;

use crate::portfolio::Currency;

/// A rate quoted for a single day. Multiplying an amount in the foreign
/// currency by foreign_to_local_rate gives the amount in the home currency.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct DailyRate {
    pub date: Date,
    pub foreign_to_local_rate: Decimal,
}

impl DailyRate {
    pub fn new(date: Date, foreign_to_local_rate: Decimal) -> DailyRate {
        DailyRate { date, foreign_to_local_rate }
    }
}

// Auto-implements to_string()
impl Display for DailyRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} : {}", self.date, self.foreign_to_local_rate)
    }
}

#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct CurrencyPair {
    pub foreign: Currency,
    pub home: Currency,
}

impl CurrencyPair {
    pub fn new(foreign: Currency, home: Currency) -> CurrencyPair {
        CurrencyPair { foreign, home }
    }

    /// The Bank of Canada Valet series for this pair, eg. FXUSDCAD.
    /// Its observations are quoted as home currency per unit of foreign.
    pub fn valet_series(&self) -> String {
        format!("FX{}{}", self.foreign, self.home)
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.foreign, self.home)
    }
}
