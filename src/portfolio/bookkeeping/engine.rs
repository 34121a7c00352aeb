use crate::portfolio::{GainsReport, Tx, TxAction};
use crate::util::decimal::{GreaterEqualZeroDecimal, PosDecimal};

use super::superficial_loss::apply_superficial_loss_rule;
use super::{AcbLedger, Error, GainAggregator, LedgerState};

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum EngineState {
    Idle,
    Running,
    Completed,
    Failed,
}

// The amounts of a Tx, after validation.
struct TxAmounts {
    shares: PosDecimal,
    amount_per_share: GreaterEqualZeroDecimal,
    commission: GreaterEqualZeroDecimal,
}

fn validate_tx_amounts(index: usize, tx: &Tx) -> Result<TxAmounts, Error> {
    let malformed = |field: &str, constraint: &str, value: &rust_decimal::Decimal| {
        Error::MalformedRecord {
            index,
            reason: format!("{} must be {} (was {})", field, constraint, value),
        }
    };
    Ok(TxAmounts {
        shares: PosDecimal::try_from(tx.shares)
            .map_err(|_| malformed("shares", "positive", &tx.shares))?,
        amount_per_share: GreaterEqualZeroDecimal::try_from(tx.amount_per_share)
            .map_err(|_| malformed("amount/share", "non-negative", &tx.amount_per_share))?,
        commission: GreaterEqualZeroDecimal::try_from(tx.commission)
            .map_err(|_| malformed("commission", "non-negative", &tx.commission))?,
    })
}

/// Validates the entire list up front, so that nothing is applied to the
/// ledger for a list which cannot be fully processed.
///
/// The Txs must be sorted by date. Txs on the same date are taken in the
/// order given (the caller decides the tiebreak); they are never re-sorted.
fn validate_txs(txs: &[Tx]) -> Result<Vec<TxAmounts>, Error> {
    let mut amounts = Vec::with_capacity(txs.len());
    for (index, tx) in txs.iter().enumerate() {
        if index > 0 && tx.date < txs[index - 1].date {
            return Err(Error::OrderingViolation {
                index,
                date: tx.date,
                preceding_date: txs[index - 1].date,
            });
        }
        amounts.push(validate_tx_amounts(index, tx)?);
    }
    Ok(amounts)
}

/// Drives a single pass over an ordered Tx list, computing the realized
/// capital gains under a pooled ACB.
///
/// Every run starts from an empty ledger, so identical input always yields
/// an identical report.
#[derive(Debug)]
pub struct GainsEngine {
    state: EngineState,
    ledger: AcbLedger,
}

impl GainsEngine {
    pub fn new() -> GainsEngine {
        GainsEngine {
            state: EngineState::Idle,
            ledger: AcbLedger::new(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The holdings after the most recent run (or partway through a failed one).
    pub fn ledger_state(&self) -> &LedgerState {
        self.ledger.state()
    }

    fn set_state(&mut self, state: EngineState) {
        tracing::debug!("GainsEngine: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    pub fn run(&mut self, txs: &[Tx]) -> Result<GainsReport, Error> {
        self.ledger = AcbLedger::new();
        self.set_state(EngineState::Running);

        match self.process_txs(txs) {
            Ok(report) => {
                self.set_state(EngineState::Completed);
                Ok(report)
            }
            Err(e) => {
                tracing::debug!("GainsEngine::run failed: {}", e);
                self.set_state(EngineState::Failed);
                Err(e)
            }
        }
    }

    fn process_txs(&mut self, txs: &[Tx]) -> Result<GainsReport, Error> {
        let all_amounts = validate_txs(txs)?;
        let mut aggregator = GainAggregator::new();

        for (idx, (tx, amounts)) in txs.iter().zip(all_amounts).enumerate() {
            match tx.action {
                TxAction::Purchase => {
                    self.ledger.apply_purchase(
                        idx, amounts.shares, amounts.amount_per_share, amounts.commission)?;
                }
                TxAction::Sale => {
                    let raw_gain = self.ledger.apply_sale(
                        idx, tx.date,
                        amounts.shares, amounts.amount_per_share, amounts.commission)?;
                    let outcome =
                        apply_superficial_loss_rule(idx, txs, raw_gain, &mut self.ledger)?;
                    aggregator.record(
                        idx, tx.date, raw_gain,
                        outcome.adjusted_gain, outcome.superficial_loss_applied)?;
                }
            }
            tracing::trace!(
                "GainsEngine: processed {} {} on {}. Ledger: {:?}",
                idx, tx.action, tx.date, self.ledger.state()
            );
        }

        Ok(aggregator.into_report())
    }
}

/// Convenience for a one-off run.
pub fn calc_capital_gains(txs: &[Tx]) -> Result<GainsReport, Error> {
    GainsEngine::new().run(txs)
}

// MARK: tests

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::portfolio::bookkeeping::{Error, LedgerState};
    use crate::portfolio::testlib::{doy_date, TTx};
    use crate::portfolio::{GainRecord, Tx, TxAction as A};
    use crate::testlib::assert_vec_eq;
    use crate::gezdec as gez;

    use super::{calc_capital_gains, EngineState, GainsEngine};

    // Shortening alias
    fn def<T: Default>() -> T {
        Default::default()
    }

    // Test Gain
    struct TGn {
        pub t_day: i64,
        pub raw: Decimal,
        pub adj: Decimal,
        pub sfl: bool,
    }

    impl TGn {
        fn x(&self) -> GainRecord {
            GainRecord {
                date: doy_date(self.t_day),
                raw_gain: self.raw,
                adjusted_gain: self.adj,
                superficial_loss_applied: self.sfl,
            }
        }
    }

    fn gn(t_day: i64, raw: Decimal) -> GainRecord {
        TGn{t_day, raw, adj: raw, sfl: false}.x()
    }

    fn sfl_gn(t_day: i64, raw: Decimal) -> GainRecord {
        TGn{t_day, raw, adj: dec!(0), sfl: true}.x()
    }

    fn run_ok(txs: Vec<Tx>) -> (GainsEngine, crate::portfolio::GainsReport) {
        let mut engine = GainsEngine::new();
        let report = engine.run(&txs).unwrap();
        (engine, report)
    }

    #[test]
    fn test_empty() {
        let (engine, report) = run_ok(vec![]);
        assert_eq!(engine.state(), EngineState::Completed);
        assert_eq!(report.total_capital_gain, dec!(0));
        assert!(report.ledger.is_empty());
    }

    #[test]
    #[rustfmt::skip]
    fn test_simple_gain() {
        let txs = vec![
            TTx{t_day: 0, act: A::Purchase, shares: dec!(100), price: dec!(10.00),
                comm: dec!(5.00), ..def()}.x(),
            TTx{t_day: 5, act: A::Sale, shares: dec!(100), price: dec!(12.00),
                comm: dec!(5.00), ..def()}.x(),
        ];
        let (engine, report) = run_ok(txs);
        // 1200 - 5 - 1005
        assert_eq!(report.total_capital_gain, dec!(190.00));
        assert_vec_eq(report.ledger, vec![gn(5, dec!(190.00))]);
        assert_eq!(*engine.ledger_state(), LedgerState::zero());
    }

    #[test]
    #[rustfmt::skip]
    fn test_superficial_loss_denied() {
        let txs = vec![
            TTx{t_day: 1, act: A::Purchase, shares: dec!(10), price: dec!(10.00), ..def()}.x(),
            TTx{t_day: 11, act: A::Sale, shares: dec!(10), price: dec!(8.00), ..def()}.x(),
            TTx{t_day: 15, act: A::Purchase, shares: dec!(10), price: dec!(8.00), ..def()}.x(),
        ];
        let (engine, report) = run_ok(txs);
        assert_eq!(report.total_capital_gain, dec!(0));
        assert_vec_eq(report.ledger, vec![sfl_gn(11, dec!(-20.00))]);
        // The denied 20 carries into the reacquired shares.
        assert_eq!(*engine.ledger_state(),
                   LedgerState{total_acb: gez!(100), share_balance: gez!(10)});
    }

    #[test]
    #[rustfmt::skip]
    fn test_denied_loss_raises_later_acb() {
        let txs = vec![
            TTx{t_day: 1, act: A::Purchase, shares: dec!(10), price: dec!(10.00), ..def()}.x(),
            TTx{t_day: 11, act: A::Sale, shares: dec!(5), price: dec!(8.00), ..def()}.x(),
            TTx{t_day: 15, act: A::Purchase, shares: dec!(5), price: dec!(8.00), ..def()}.x(),
            // ACB is now 50 + 10 (denied) + 40 = 100 over 10 shares
            TTx{t_day: 100, act: A::Sale, shares: dec!(10), price: dec!(11.00), ..def()}.x(),
        ];
        let (_, report) = run_ok(txs);
        assert_vec_eq(report.ledger, vec![
            sfl_gn(11, dec!(-10)),
            gn(100, dec!(10)),
        ]);
        assert_eq!(report.total_capital_gain, dec!(10));
    }

    #[test]
    #[rustfmt::skip]
    fn test_loss_not_superficial_when_neighbours_distant() {
        let txs = vec![
            TTx{t_day: 1, act: A::Purchase, shares: dec!(10), price: dec!(1.0),
                comm: dec!(2.0), ..def()}.x(),
            // Sell half at a loss a while later
            TTx{t_day: 50, act: A::Sale, shares: dec!(5), price: dec!(0.2), ..def()}.x(),
            TTx{t_day: 100, act: A::Purchase, shares: dec!(1), price: dec!(0.2), ..def()}.x(),
        ];
        let (engine, report) = run_ok(txs);
        assert_vec_eq(report.ledger, vec![gn(50, dec!(-5.0))]);
        assert_eq!(report.total_capital_gain, dec!(-5.0));
        assert_eq!(*engine.ledger_state(),
                   LedgerState{total_acb: gez!(6.2), share_balance: gez!(6)});
    }

    #[test]
    #[rustfmt::skip]
    fn test_inclusive_period_boundaries() {
        // Preceding Tx exactly 30 days before.
        let txs = vec![
            TTx{t_day: 0, act: A::Purchase, shares: dec!(10), price: dec!(10), ..def()}.x(),
            TTx{t_day: 30, act: A::Sale, shares: dec!(5), price: dec!(9), ..def()}.x(),
            TTx{t_day: 200, act: A::Purchase, shares: dec!(5), price: dec!(9), ..def()}.x(),
        ];
        let (_, report) = run_ok(txs);
        assert_vec_eq(report.ledger, vec![sfl_gn(30, dec!(-5))]);

        // Preceding Tx 31 days before, following 31 days after.
        let txs = vec![
            TTx{t_day: 0, act: A::Purchase, shares: dec!(10), price: dec!(10), ..def()}.x(),
            TTx{t_day: 31, act: A::Sale, shares: dec!(5), price: dec!(9), ..def()}.x(),
            TTx{t_day: 62, act: A::Purchase, shares: dec!(5), price: dec!(9), ..def()}.x(),
        ];
        let (_, report) = run_ok(txs);
        assert_vec_eq(report.ledger, vec![gn(31, dec!(-5))]);

        // Following Tx exactly 30 days after.
        let txs = vec![
            TTx{t_day: 0, act: A::Purchase, shares: dec!(10), price: dec!(10), ..def()}.x(),
            TTx{t_day: 31, act: A::Sale, shares: dec!(5), price: dec!(9), ..def()}.x(),
            TTx{t_day: 61, act: A::Purchase, shares: dec!(5), price: dec!(9), ..def()}.x(),
        ];
        let (_, report) = run_ok(txs);
        assert_vec_eq(report.ledger, vec![sfl_gn(31, dec!(-5))]);
    }

    #[test]
    #[rustfmt::skip]
    fn test_boundary_exclusion() {
        // A loss on the last Tx is never superficial, even right after a buy.
        let txs = vec![
            TTx{t_day: 1, act: A::Purchase, shares: dec!(10), price: dec!(10), ..def()}.x(),
            TTx{t_day: 2, act: A::Sale, shares: dec!(10), price: dec!(8), ..def()}.x(),
        ];
        let (engine, report) = run_ok(txs);
        assert_vec_eq(report.ledger, vec![gn(2, dec!(-20))]);
        assert_eq!(report.total_capital_gain, dec!(-20));
        assert_eq!(*engine.ledger_state(), LedgerState::zero());
    }

    #[test]
    #[rustfmt::skip]
    fn test_sale_adjacent_to_sale() {
        // The neighbour check does not care about the action of the neighbour.
        let txs = vec![
            TTx{t_day: 0, act: A::Purchase, shares: dec!(10), price: dec!(10), ..def()}.x(),
            TTx{t_day: 100, act: A::Sale, shares: dec!(2), price: dec!(12), ..def()}.x(),
            TTx{t_day: 101, act: A::Sale, shares: dec!(2), price: dec!(9), ..def()}.x(),
            TTx{t_day: 300, act: A::Sale, shares: dec!(2), price: dec!(12), ..def()}.x(),
        ];
        let (_, report) = run_ok(txs);
        assert_vec_eq(report.ledger, vec![
            gn(100, dec!(4)),
            sfl_gn(101, dec!(-2)),
            // ACB of the remaining 6 shares is 60 + 2 (denied)
            TGn{t_day: 300, raw: dec!(24) - (dec!(62) / dec!(6) * dec!(2)),
                adj: dec!(24) - (dec!(62) / dec!(6) * dec!(2)), sfl: false}.x(),
        ]);
    }

    #[test]
    #[rustfmt::skip]
    fn test_insufficient_holdings() {
        let txs = vec![
            TTx{t_day: 0, act: A::Purchase, shares: dec!(10), price: dec!(10), ..def()}.x(),
            TTx{t_day: 1, act: A::Sale, shares: dec!(50), price: dec!(10), ..def()}.x(),
        ];
        let mut engine = GainsEngine::new();
        let err = engine.run(&txs).unwrap_err();
        assert_eq!(err, Error::InsufficientHoldings{
            index: 1, date: doy_date(1), shares: dec!(50), holdings: dec!(10)});
        assert_eq!(engine.state(), EngineState::Failed);

        // Selling with no holdings at all
        let txs = vec![
            TTx{t_day: 0, act: A::Sale, shares: dec!(1), price: dec!(10), ..def()}.x(),
        ];
        let err = calc_capital_gains(&txs).unwrap_err();
        assert_eq!(err, Error::InsufficientHoldings{
            index: 0, date: doy_date(0), shares: dec!(1), holdings: dec!(0)});
    }

    #[test]
    #[rustfmt::skip]
    fn test_ordering_violation() {
        let txs = vec![
            TTx{t_day: 5, act: A::Purchase, shares: dec!(10), price: dec!(10), ..def()}.x(),
            TTx{t_day: 5, act: A::Purchase, shares: dec!(10), price: dec!(10), ..def()}.x(),
            TTx{t_day: 4, act: A::Sale, shares: dec!(1), price: dec!(10), ..def()}.x(),
        ];
        let mut engine = GainsEngine::new();
        let err = engine.run(&txs).unwrap_err();
        assert_eq!(err, Error::OrderingViolation{
            index: 2, date: doy_date(4), preceding_date: doy_date(5)});
        assert_eq!(engine.state(), EngineState::Failed);
        // Nothing was applied
        assert_eq!(*engine.ledger_state(), LedgerState::zero());
    }

    #[test]
    #[rustfmt::skip]
    fn test_malformed_records() {
        let good_buy = TTx{t_day: 0, act: A::Purchase, shares: dec!(10), price: dec!(10),
                           ..def()}.x();

        let bad = TTx{t_day: 1, act: A::Sale, shares: dec!(0), price: dec!(10), ..def()}.x();
        let err = calc_capital_gains(&vec![good_buy.clone(), bad]).unwrap_err();
        assert_eq!(err, Error::MalformedRecord{
            index: 1, reason: "shares must be positive (was 0)".to_string()});

        let bad = TTx{t_day: 1, act: A::Sale, shares: dec!(1), price: dec!(-10), ..def()}.x();
        let err = calc_capital_gains(&vec![good_buy.clone(), bad]).unwrap_err();
        assert_eq!(err, Error::MalformedRecord{
            index: 1, reason: "amount/share must be non-negative (was -10)".to_string()});

        let bad = TTx{t_day: 1, act: A::Purchase, shares: dec!(1), price: dec!(10),
                      comm: dec!(-1), ..def()}.x();
        let err = calc_capital_gains(&vec![good_buy.clone(), bad]).unwrap_err();
        assert_eq!(err, Error::MalformedRecord{
            index: 1, reason: "commission must be non-negative (was -1)".to_string()});
    }

    #[test]
    #[rustfmt::skip]
    fn test_engine_rerun_is_deterministic() {
        let txs = vec![
            TTx{t_day: 0, act: A::Purchase, shares: dec!(30), price: dec!(10), comm: dec!(1),
                ..def()}.x(),
            TTx{t_day: 3, act: A::Sale, shares: dec!(7), price: dec!(9.5), comm: dec!(1),
                ..def()}.x(),
            TTx{t_day: 3, act: A::Purchase, shares: dec!(4), price: dec!(9.1), ..def()}.x(),
            TTx{t_day: 90, act: A::Sale, shares: dec!(11), price: dec!(13.37), comm: dec!(2),
                ..def()}.x(),
        ];
        let mut engine = GainsEngine::new();
        assert_eq!(engine.state(), EngineState::Idle);
        let first = engine.run(&txs).unwrap();
        let first_state = *engine.ledger_state();
        let second = engine.run(&txs).unwrap();
        assert_eq!(engine.state(), EngineState::Completed);
        assert_eq!(first, second);
        assert_eq!(first_state, *engine.ledger_state());
        // Bit-for-bit, including the decimal scale.
        assert_eq!(first.total_capital_gain.serialize(),
                   second.total_capital_gain.serialize());
    }
}
