use rust_decimal::Decimal;
use time::Date;

/// Fatal errors of a gains calculation. Any of these aborts the entire run;
/// no partial totals are ever produced.
#[derive(PartialEq, Eq, Clone, Debug, thiserror::Error)]
pub enum Error {
    #[error("Sale on {date} (transaction {index}) of {shares} shares is more than \
             the current holdings ({holdings})")]
    InsufficientHoldings {
        index: usize,
        date: Date,
        shares: Decimal,
        holdings: Decimal,
    },

    /// `index` depends on the stage which found the problem. The engine
    /// reports the position in the sorted Tx list. CSV parsing reports the
    /// row number in the file, and conversion to the home currency reports
    /// the Tx read_index.
    #[error("Malformed transaction {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    #[error("Transaction {index} on {date} is dated before the transaction preceding \
             it ({preceding_date}). Transactions must be sorted by date")]
    OrderingViolation {
        index: usize,
        date: Date,
        preceding_date: Date,
    },
}
