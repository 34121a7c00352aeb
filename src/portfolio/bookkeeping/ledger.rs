use rust_decimal::Decimal;
use time::Date;

use crate::util::decimal::{GreaterEqualZeroDecimal, NegDecimal, PosDecimal};

use super::Error;

/// The pooled holdings of the tracked security.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct LedgerState {
    pub total_acb: GreaterEqualZeroDecimal,
    pub share_balance: GreaterEqualZeroDecimal,
}

impl LedgerState {
    pub fn zero() -> LedgerState {
        LedgerState {
            total_acb: GreaterEqualZeroDecimal::zero(),
            share_balance: GreaterEqualZeroDecimal::zero(),
        }
    }

    /// The average cost of one share. None if the division overflows.
    pub fn per_share_acb(&self) -> Option<Decimal> {
        if self.share_balance.is_zero() {
            Some(Decimal::ZERO)
        } else {
            self.total_acb.checked_div(*self.share_balance)
        }
    }
}

fn amount_overflow(index: usize, what: &str) -> Error {
    Error::MalformedRecord {
        index,
        reason: format!("amount overflow computing {}", what),
    }
}

/// Owns the LedgerState, and is the only thing which may mutate it.
///
/// All arithmetic is checked. `index` on each operation is the position of
/// the Tx being applied, and is only used for error reporting.
#[derive(Debug)]
pub struct AcbLedger {
    state: LedgerState,
}

impl AcbLedger {
    pub fn new() -> AcbLedger {
        AcbLedger { state: LedgerState::zero() }
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn apply_purchase(
        &mut self,
        index: usize,
        shares: PosDecimal,
        amount_per_share: GreaterEqualZeroDecimal,
        commission: GreaterEqualZeroDecimal,
    ) -> Result<(), Error> {
        let total_cost = amount_per_share
            .checked_mul(shares.into())
            .and_then(|c| c.checked_add(commission))
            .ok_or_else(|| amount_overflow(index, "purchase cost"))?;
        let total_acb = self.state.total_acb
            .checked_add(total_cost)
            .ok_or_else(|| amount_overflow(index, "ACB"))?;
        let share_balance = self.state.share_balance
            .checked_add(shares.into())
            .ok_or_else(|| amount_overflow(index, "share balance"))?;

        self.state = LedgerState { total_acb, share_balance };
        tracing::trace!(
            "AcbLedger::apply_purchase: cost = {}, post state = {:?}",
            total_cost, self.state
        );
        Ok(())
    }

    /// Removes the sold shares (and their share of the ACB) from the pool,
    /// and returns the unadjusted capital gain. Negative is a loss.
    ///
    /// The state is untouched on error.
    pub fn apply_sale(
        &mut self,
        index: usize,
        date: Date,
        shares: PosDecimal,
        amount_per_share: GreaterEqualZeroDecimal,
        commission: GreaterEqualZeroDecimal,
    ) -> Result<Decimal, Error> {
        let pre_state = self.state;
        let insufficient = || Error::InsufficientHoldings {
            index,
            date,
            shares: *shares,
            holdings: *pre_state.share_balance,
        };

        if pre_state.share_balance.is_zero() {
            return Err(insufficient());
        }
        let new_share_balance = pre_state.share_balance
            .checked_sub(*shares)
            .ok_or_else(insufficient)?;

        // Closing the position releases the entire ACB, so that no division
        // residue can linger on zero shares.
        let sold_acb = if new_share_balance.is_zero() {
            *pre_state.total_acb
        } else {
            pre_state
                .per_share_acb()
                .and_then(|per_share| per_share.checked_mul(*shares))
                .ok_or_else(|| amount_overflow(index, "sold ACB"))?
        };
        let new_total_acb = pre_state.total_acb
            .checked_sub(sold_acb)
            .unwrap_or_else(GreaterEqualZeroDecimal::zero);

        // Commission reduces proceeds. It has no effect on the remaining ACB.
        let raw_gain = amount_per_share
            .checked_mul(shares.into())
            .and_then(|proceeds| (*proceeds).checked_sub(*commission))
            .and_then(|payout| payout.checked_sub(sold_acb))
            .ok_or_else(|| amount_overflow(index, "sale proceeds"))?;

        self.state = LedgerState {
            total_acb: new_total_acb,
            share_balance: new_share_balance,
        };
        tracing::debug!(
            "AcbLedger::apply_sale: sold_acb = {}, raw_gain = {}, post state = {:?}",
            sold_acb, raw_gain, self.state
        );
        Ok(raw_gain)
    }

    /// Adds a denied (superficial) loss back into the ACB of the pool.
    pub fn add_denied_loss_to_acb(
        &mut self,
        index: usize,
        loss: NegDecimal,
    ) -> Result<(), Error> {
        self.state.total_acb = self.state.total_acb
            .checked_add(loss.magnitude().into())
            .ok_or_else(|| amount_overflow(index, "ACB"))?;
        Ok(())
    }
}
