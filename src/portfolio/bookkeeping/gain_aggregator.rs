use rust_decimal::Decimal;
use time::Date;

use crate::portfolio::{GainRecord, GainsReport};

use super::Error;

/// Accumulates the (possibly adjusted) gain of every sale, in order.
#[derive(Debug, Default)]
pub struct GainAggregator {
    total_capital_gain: Decimal,
    ledger: Vec<GainRecord>,
}

impl GainAggregator {
    pub fn new() -> GainAggregator {
        GainAggregator::default()
    }

    /// `index` is the position of the sale, for error reporting.
    pub fn record(
        &mut self,
        index: usize,
        date: Date,
        raw_gain: Decimal,
        adjusted_gain: Decimal,
        superficial_loss_applied: bool,
    ) -> Result<(), Error> {
        self.total_capital_gain = self.total_capital_gain
            .checked_add(adjusted_gain)
            .ok_or_else(|| Error::MalformedRecord {
                index,
                reason: "amount overflow computing total capital gain".to_string(),
            })?;
        self.ledger.push(GainRecord {
            date,
            raw_gain,
            adjusted_gain,
            superficial_loss_applied,
        });
        Ok(())
    }

    #[cfg(test)]
    fn total_capital_gain(&self) -> Decimal {
        self.total_capital_gain
    }

    #[cfg(test)]
    fn ledger(&self) -> &[GainRecord] {
        &self.ledger
    }

    pub fn into_report(self) -> GainsReport {
        GainsReport {
            total_capital_gain: self.total_capital_gain,
            ledger: self.ledger,
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::portfolio::bookkeeping::Error;
    use crate::portfolio::testlib::doy_date;
    use crate::portfolio::GainRecord;

    use super::GainAggregator;

    #[test]
    fn test_record() {
        let mut agg = GainAggregator::new();
        assert_eq!(agg.total_capital_gain(), dec!(0));
        assert!(agg.ledger().is_empty());

        agg.record(0, doy_date(1), dec!(190), dec!(190), false).unwrap();
        agg.record(1, doy_date(2), dec!(-20), dec!(0), true).unwrap();
        agg.record(2, doy_date(3), dec!(-5.5), dec!(-5.5), false).unwrap();
        assert_eq!(agg.total_capital_gain(), dec!(184.5));

        let report = agg.into_report();
        assert_eq!(report.total_capital_gain, dec!(184.5));
        assert_eq!(report.ledger, vec![
            GainRecord{date: doy_date(1), raw_gain: dec!(190), adjusted_gain: dec!(190),
                       superficial_loss_applied: false},
            GainRecord{date: doy_date(2), raw_gain: dec!(-20), adjusted_gain: dec!(0),
                       superficial_loss_applied: true},
            GainRecord{date: doy_date(3), raw_gain: dec!(-5.5), adjusted_gain: dec!(-5.5),
                       superficial_loss_applied: false},
        ]);
    }

    #[test]
    fn test_record_total_overflow() {
        let mut agg = GainAggregator::new();
        agg.record(0, doy_date(1), Decimal::MAX, Decimal::MAX, false).unwrap();
        let err = agg.record(4, doy_date(2), dec!(1), dec!(1), false).unwrap_err();
        assert_eq!(err, Error::MalformedRecord{
            index: 4, reason: "amount overflow computing total capital gain".to_string()});
        assert_eq!(agg.ledger().len(), 1);
    }
}
