use std::io::Write;

use serde::Serialize;

use crate::portfolio::GainsReport;
use crate::util::rw::WriteHandle;

use super::model::Error;

#[derive(Serialize)]
struct JsonYearTotal {
    year: i32,
    capital_gain: rust_decimal::Decimal,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a GainsReport,
    yearly_totals: Vec<JsonYearTotal>,
}

/// Writes the full report as pretty-printed JSON, with the per-year totals
/// alongside.
///
/// Decimals are written as strings, so no precision is lost.
pub fn write_report_json(w: &mut WriteHandle, report: &GainsReport) -> Result<(), Error> {
    let gains = crate::portfolio::calc_cumulative_capital_gains(&report.ledger);
    let yearly_totals = gains
        .capital_gains_year_totals_keys_sorted()
        .into_iter()
        .map(|year| JsonYearTotal {
            year,
            capital_gain: gains.capital_gains_years_totals[&year],
        })
        .collect();

    let out = JsonOutput { report, yearly_totals };
    serde_json::to_writer_pretty(&mut *w, &out).map_err(|e| e.to_string())?;
    writeln!(w).map_err(|e| e.to_string())
}
