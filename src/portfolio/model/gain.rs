use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

/// The realized result of a single sale. Immutable once emitted.
#[derive(PartialEq, Eq, Clone, Debug, Serialize)]
pub struct GainRecord {
    pub date: Date,
    pub raw_gain: Decimal,
    pub adjusted_gain: Decimal,
    pub superficial_loss_applied: bool,
}

impl GainRecord {
    /// The portion of the raw loss which was denied (and added back to the ACB).
    /// Zero unless a superficial loss was applied.
    pub fn denied_loss(&self) -> Decimal {
        self.adjusted_gain - self.raw_gain
    }
}

#[derive(PartialEq, Eq, Clone, Debug, Serialize)]
pub struct GainsReport {
    pub total_capital_gain: Decimal,
    pub ledger: Vec<GainRecord>,
}
