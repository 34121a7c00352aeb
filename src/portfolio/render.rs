use rust_decimal::Decimal;

use crate::util::decimal::{dollar_precision_str, is_negative};

use super::{CumulativeCapitalGains, GainsReport};

pub struct RenderTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub footer: Vec<String>,
    pub notes: Vec<String>,
    pub errors: Vec<String>,
}

pub struct GainsTables {
    pub ledger: RenderTable,
    pub yearly: RenderTable,
}

fn plus_minus_dollar(d: &Decimal, render_full_dollar_values: bool) -> String {
    let abs = d.abs();
    let val_str = if render_full_dollar_values {
        abs.to_string()
    } else {
        dollar_precision_str(&abs)
    };
    if is_negative(d) {
        format!("-${}", val_str)
    } else {
        format!("${}", val_str)
    }
}

fn strs(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
}

/// One row per sale, with the total adjusted gain in the footer.
pub fn render_gains_table_model(
    report: &GainsReport,
    render_full_dollar_values: bool,
) -> RenderTable {
    let pm = |d: &Decimal| plus_minus_dollar(d, render_full_dollar_values);

    let header = strs(&["#", "Sale Date", "Raw Gain", "Denied Loss", "Capital Gain"]);

    let mut n_superficial = 0;
    let rows = report
        .ledger
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let denied = if r.superficial_loss_applied {
                n_superficial += 1;
                format!("{} *", pm(&r.denied_loss()))
            } else {
                "-".to_string()
            };
            vec![
                (i + 1).to_string(),
                r.date.to_string(),
                pm(&r.raw_gain),
                denied,
                pm(&r.adjusted_gain),
            ]
        })
        .collect();

    let footer = vec![
        String::new(),
        String::new(),
        String::new(),
        "Total".to_string(),
        pm(&report.total_capital_gain),
    ];

    let mut notes = Vec::new();
    if n_superficial > 0 {
        notes.push(format!(
            " * {} superficial loss(es) denied. Denied losses are added to the ACB \
            of the remaining or reacquired shares.",
            n_superficial
        ));
    }

    RenderTable {
        header,
        rows,
        footer,
        notes,
        errors: vec![],
    }
}

pub fn render_yearly_gains_table_model(
    gains: &CumulativeCapitalGains,
    render_full_dollar_values: bool,
) -> RenderTable {
    let pm = |d: &Decimal| plus_minus_dollar(d, render_full_dollar_values);

    let rows = gains
        .capital_gains_year_totals_keys_sorted()
        .into_iter()
        .map(|year| {
            let total = gains
                .capital_gains_years_totals
                .get(&year)
                .copied()
                .unwrap_or(Decimal::ZERO);
            vec![year.to_string(), pm(&total)]
        })
        .collect();

    RenderTable {
        header: strs(&["Year", "Capital Gains"]),
        rows,
        footer: vec!["Since inception".to_string(), pm(&gains.capital_gains_total)],
        notes: vec![],
        errors: vec![],
    }
}

pub fn render_gains_tables(
    report: &GainsReport,
    gains: &CumulativeCapitalGains,
    render_full_dollar_values: bool,
) -> GainsTables {
    GainsTables {
        ledger: render_gains_table_model(report, render_full_dollar_values),
        yearly: render_yearly_gains_table_model(gains, render_full_dollar_values),
    }
}
