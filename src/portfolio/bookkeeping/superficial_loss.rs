// Only meant to be accessible by other parts of the bookkeeping module,
// aside from the period helpers.

use rust_decimal::Decimal;
use time::Date;

use crate::portfolio::Tx;
use crate::util::date::{add_days, sub_days};
use crate::util::decimal::NegDecimal;

use super::{AcbLedger, Error};

const SUPERFICIAL_LOSS_PERIOD_DAYS: i64 = 30;

pub fn get_first_day_in_superficial_loss_period(settlement_date: Date) -> Date {
    sub_days(settlement_date, SUPERFICIAL_LOSS_PERIOD_DAYS)
}

pub fn get_last_day_in_superficial_loss_period(settlement_date: Date) -> Date {
    add_days(settlement_date, SUPERFICIAL_LOSS_PERIOD_DAYS)
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct SflOutcome {
    pub adjusted_gain: Decimal,
    pub superficial_loss_applied: bool,
}

impl SflOutcome {
    fn not_superficial(raw_gain: Decimal) -> SflOutcome {
        SflOutcome { adjusted_gain: raw_gain, superficial_loss_applied: false }
    }
}

/// Checks whether the Tx immediately before or after the sale at idx falls
/// within 30 days (inclusive) of it.
///
/// Only the adjacent Txs are considered, not every Tx in the period.
/// The first and last Tx of the sequence are never considered superficial,
/// since we cannot see beyond the ends of the list.
pub(super) fn adjacent_tx_in_superficial_loss_period(idx: usize, txs: &[Tx]) -> bool {
    if idx == 0 || idx + 1 >= txs.len() {
        return false;
    }
    let sale_date = txs[idx].date;
    let preceding_date = txs[idx - 1].date;
    let following_date = txs[idx + 1].date;

    preceding_date >= get_first_day_in_superficial_loss_period(sale_date)
        || following_date <= get_last_day_in_superficial_loss_period(sale_date)
}

/// Decides whether the raw gain of the sale at idx is a denied superficial
/// loss. If so, the loss is added back into the ledger's ACB, and the
/// adjusted gain becomes zero.
pub(super) fn apply_superficial_loss_rule(
    idx: usize,
    txs: &[Tx],
    raw_gain: Decimal,
    ledger: &mut AcbLedger,
) -> Result<SflOutcome, Error> {
    let loss = match NegDecimal::try_from(raw_gain) {
        Ok(l) => l,
        Err(_) => return Ok(SflOutcome::not_superficial(raw_gain)),
    };

    if !adjacent_tx_in_superficial_loss_period(idx, txs) {
        return Ok(SflOutcome::not_superficial(raw_gain));
    }

    ledger.add_denied_loss_to_acb(idx, loss)?;
    tracing::info!(
        "Superficial loss of {} denied for sale {} on {}. ACB is now {}",
        loss, idx, txs[idx].date, ledger.state().total_acb
    );
    Ok(SflOutcome { adjusted_gain: Decimal::ZERO, superficial_loss_applied: true })
}
