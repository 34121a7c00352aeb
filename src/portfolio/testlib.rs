// Helpers for building Txs in unit and integration tests.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use time::Date;

use crate::util::date::pub_testlib::doy_date as year_doy_date;

use super::{CsvTx, Currency, Tx, TxAction};

pub const DEFAULT_TEST_YEAR: u32 = 2024;

/// Day-of-year date in the default test year. doy_date(0) is January 1st.
pub fn doy_date(day: i64) -> Date {
    year_doy_date(DEFAULT_TEST_YEAR, day)
}

// Test Tx
#[derive(Clone, Debug)]
pub struct TTx {
    pub t_day: i64,
    pub act: TxAction,
    pub shares: Decimal,
    pub price: Decimal,
    pub comm: Decimal,
    pub curr: Option<Currency>,
    pub fx_rate: Option<Decimal>,
    pub memo: String,
    pub read_index: u32,
}

impl Default for TTx {
    fn default() -> Self {
        TTx {
            t_day: 0,
            act: TxAction::Purchase,
            shares: dec!(1),
            price: dec!(1),
            comm: dec!(0),
            curr: None,
            fx_rate: None,
            memo: String::new(),
            read_index: 0,
        }
    }
}

impl TTx {
    /// Home-currency Tx. curr and fx_rate are ignored.
    pub fn x(&self) -> Tx {
        Tx {
            date: doy_date(self.t_day),
            action: self.act,
            shares: self.shares,
            amount_per_share: self.price,
            commission: self.comm,
            memo: self.memo.clone(),
            read_index: self.read_index,
        }
    }

    pub fn csv(&self) -> CsvTx {
        CsvTx {
            date: Some(doy_date(self.t_day)),
            action: Some(self.act),
            shares: Some(self.shares),
            amount_per_share: Some(self.price),
            commission: Some(self.comm),
            currency: self.curr.clone(),
            curr_to_local_exchange_rate: self.fx_rate,
            memo: if self.memo.is_empty() { None } else { Some(self.memo.clone()) },
            read_index: self.read_index,
        }
    }
}
