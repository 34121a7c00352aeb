use std::fmt::Display;

use rust_decimal::Decimal;
use serde::Serialize;
use time::Date;

use crate::portfolio::bookkeeping::Error;
use crate::util::decimal::{is_positive, to_string_min_precision};

use super::currency::Currency;

#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize)]
pub enum TxAction {
    Purchase,
    Sale,
}

impl TxAction {
    fn pretty_str(&self) -> &str {
        match self {
            TxAction::Purchase => "Buy",
            TxAction::Sale => "Sell",
        }
    }
}

impl Display for TxAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.pretty_str())
    }
}

/// A canonical trade, with all monetary values already in the home currency.
///
/// Amounts are deliberately unconstrained here; the gains engine validates
/// them (and reports a MalformedRecord) before applying anything.
#[derive(PartialEq, Eq, Clone, Debug, Serialize)]
pub struct Tx {
    pub date: Date,
    pub action: TxAction,
    pub shares: Decimal,
    pub amount_per_share: Decimal,
    pub commission: Decimal,

    pub memo: String,

    // The absolute order in which the Tx was read from file or entered.
    // Used as a tiebreak in sorting.
    pub read_index: u32,
}

impl PartialOrd for Tx {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tx {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.date.cmp(&other.date)
            .then(self.read_index.cmp(&other.read_index))
    }
}

/// A transaction as it appears in an input file, before currency conversion.
/// Every field may be absent, since we cannot trust the file.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct CsvTx {
    pub date: Option<Date>,
    pub action: Option<TxAction>,
    pub shares: Option<Decimal>,
    pub amount_per_share: Option<Decimal>,
    pub commission: Option<Decimal>,
    pub currency: Option<Currency>,
    pub curr_to_local_exchange_rate: Option<Decimal>,
    pub memo: Option<String>,
    pub read_index: u32,
}

impl CsvTx {
    /// The currency the amounts are expressed in. Unspecified means the
    /// home currency.
    pub fn currency_or(&self, home_currency: &Currency) -> Currency {
        self.currency.clone().unwrap_or_else(|| home_currency.clone())
    }

    /// Whether this Tx still needs an exchange rate to be converted.
    pub fn needs_exchange_rate(&self, home_currency: &Currency) -> bool {
        self.currency_or(home_currency) != *home_currency
            && self.curr_to_local_exchange_rate.is_none()
    }

    /// Converts into a home-currency Tx.
    ///
    /// Amounts are multiplied by the exchange rate only when the Tx currency
    /// differs from the home currency. A home-currency Tx which specifies a
    /// rate other than 1 is rejected.
    ///
    /// The `index` of any MalformedRecord error is this Tx's read_index.
    pub fn into_tx(self, home_currency: &Currency) -> Result<Tx, Error> {
        let index = self.read_index as usize;
        let missing = |field: &str| Error::MalformedRecord {
            index,
            reason: format!("{} not specified", field),
        };

        let date = self.date.ok_or_else(|| missing("date"))?;
        let action = self.action.ok_or_else(|| missing("action"))?;
        let shares = self.shares.ok_or_else(|| missing("shares"))?;
        let amount_per_share =
            self.amount_per_share.ok_or_else(|| missing("amount/share"))?;
        let commission = self.commission.unwrap_or(Decimal::ZERO);

        let currency = self.currency_or(home_currency);
        let rate = if currency == *home_currency {
            match self.curr_to_local_exchange_rate {
                Some(r) if r != Decimal::ONE => {
                    return Err(Error::MalformedRecord {
                        index,
                        reason: format!(
                            "{} exchange rate was not 1 (was {})", home_currency, r),
                    });
                }
                _ => Decimal::ONE,
            }
        } else {
            match self.curr_to_local_exchange_rate {
                Some(r) if is_positive(&r) => r,
                Some(r) => {
                    return Err(Error::MalformedRecord {
                        index,
                        reason: format!(
                            "{} exchange rate must be positive (was {})", currency, r),
                    });
                }
                None => return Err(missing(&format!("{} exchange rate", currency))),
            }
        };

        let mut memo = self.memo.unwrap_or_default();
        if rate != Decimal::ONE {
            let note = format!(
                "Converted from {} at {}", currency, to_string_min_precision(&rate, 0));
            memo = if memo.is_empty() { note } else { format!("{}. {}", memo, note) };
        }

        let overflow = |field: &str| Error::MalformedRecord {
            index,
            reason: format!("amount overflow converting {} from {}", field, currency),
        };
        let amount_per_share = amount_per_share
            .checked_mul(rate)
            .ok_or_else(|| overflow("amount/share"))?;
        let commission = commission
            .checked_mul(rate)
            .ok_or_else(|| overflow("commission"))?;

        Ok(Tx {
            date,
            action,
            shares,
            amount_per_share,
            commission,
            memo,
            read_index: self.read_index,
        })
    }
}
