use std::collections::HashMap;

use rust_decimal::Decimal;

use super::GainRecord;

pub struct CumulativeCapitalGains {
    pub capital_gains_total: Decimal,
    pub capital_gains_years_totals: HashMap<i32, Decimal>,
}

impl CumulativeCapitalGains {
    pub fn capital_gains_year_totals_keys_sorted(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.capital_gains_years_totals.keys().copied().collect();
        years.sort();
        years
    }
}

/// Rolls up the adjusted gains of a ledger by the calendar year of each sale.
pub fn calc_cumulative_capital_gains(ledger: &[GainRecord]) -> CumulativeCapitalGains {
    let mut capital_gains_total = Decimal::ZERO;
    let mut cap_gains_year_totals = HashMap::<i32, Decimal>::new();

    for record in ledger {
        capital_gains_total += record.adjusted_gain;
        *cap_gains_year_totals.entry(record.date.year()).or_insert(Decimal::ZERO) +=
            record.adjusted_gain;
    }

    CumulativeCapitalGains {
        capital_gains_total,
        capital_gains_years_totals: cap_gains_year_totals,
    }
}
