use std::collections::HashMap;
use std::io::Write;

use rust_decimal::Decimal;
use time::{Date, Month};
use tracing::{debug, trace};

use crate::fx::{CurrencyPair, DailyRate};
use crate::portfolio::Currency;
use crate::util::date::sub_days;
use crate::util::rw::WriteHandle;
use crate::write_errln;

use super::{Error, RemoteRateLoader};

// Limit to 7 days look-back. This is arbitrarily chosen as a large-enough value
// (unless the markets close for more than a week due to an apocalypse)
const MAX_LOOK_BACK_DAYS: i64 = 7;

/// Finds the rates to convert foreign currency amounts into the home currency.
///
/// Rates are fetched a calendar year at a time, and kept for the life of the
/// loader, so each (pair, year) is only requested once.
pub struct RateLoader {
    home_currency: Currency,
    remote_loader: Box<dyn RemoteRateLoader>,
    err_stream: WriteHandle,

    year_rates: HashMap<(CurrencyPair, i32), HashMap<Date, DailyRate>>,
}

impl RateLoader {
    pub fn new(
        home_currency: Currency,
        remote_loader: Box<dyn RemoteRateLoader>,
        err_stream: WriteHandle,
    ) -> RateLoader {
        RateLoader {
            home_currency,
            remote_loader,
            err_stream,
            year_rates: HashMap::new(),
        }
    }

    pub fn home_currency(&self) -> &Currency {
        &self.home_currency
    }
}

fn year_bounds(year: i32) -> Result<(Date, Date), Error> {
    let start = Date::from_calendar_date(year, Month::January, 1)
        .map_err(|e| e.to_string())?;
    let end = Date::from_calendar_date(year, Month::December, 31)
        .map_err(|e| e.to_string())?;
    Ok((start, end))
}

fn make_date_to_rate_map(rates: Vec<DailyRate>) -> HashMap<Date, DailyRate> {
    rates.into_iter().map(|r| (r.date, r)).collect()
}

impl RateLoader {
    // As per the CRA's interpretation of Section 261 (1.4) of the Income Tax Act,
    // the relevant spot rate is the rate quoted by the Bank of Canada on that day.
    // If no rate is quoted for that particular day, then the closest preceding
    // day for which such a rate is quoted should be used.

    /// Gets the rate quoted on date, or on the closest preceding quoted day,
    /// no more than 7 days back.
    ///
    /// The home currency always has a rate of 1.
    pub async fn get_effective_rate(
        &mut self,
        currency: &Currency,
        date: Date,
    ) -> Result<DailyRate, Error> {
        if *currency == self.home_currency {
            return Ok(DailyRate::new(date, Decimal::ONE));
        }
        let pair = CurrencyPair::new(currency.clone(), self.home_currency.clone());

        let fmt_err = |e: Error| {
            format!("Unable to retrieve {} exchange rate for {}: {}", pair, date, e)
        };

        let mut lookup_date = date;
        for _ in 0..=MAX_LOOK_BACK_DAYS {
            let rate_opt = self.get_exact_rate(&pair, lookup_date).await
                .map_err(fmt_err)?;
            if let Some(rate) = rate_opt {
                if lookup_date != date {
                    debug!("RateLoader: using {} rate from {} for {}", pair, lookup_date, date);
                }
                return Ok(rate);
            }
            lookup_date = sub_days(lookup_date, 1);
        }

        Err(fmt_err(format!(
            "No rate was quoted within the {} preceding days", MAX_LOOK_BACK_DAYS)))
    }

    async fn get_exact_rate(
        &mut self,
        pair: &CurrencyPair,
        date: Date,
    ) -> Result<Option<DailyRate>, Error> {
        let key = (pair.clone(), date.year());
        if !self.year_rates.contains_key(&key) {
            debug!("RateLoader::get_exact_rate {} {} not yet loaded", pair, date.year());
            let rates = self.get_remote_rates_for_year(pair, date.year()).await?;
            self.year_rates.insert(key.clone(), rates);
        }
        Ok(self.year_rates.get(&key).and_then(|rates| rates.get(&date)).cloned())
    }

    async fn get_remote_rates_for_year(
        &mut self,
        pair: &CurrencyPair,
        year: i32,
    ) -> Result<HashMap<Date, DailyRate>, Error> {
        trace!(year = year, "RateLoader::get_remote_rates_for_year");
        let (start, end) = year_bounds(year)?;
        let res = self.remote_loader.get_remote_rates(pair, start, end).await
            .map_err(|e| e.to_string())?;
        for nfe in res.non_fatal_errors {
            write_errln!(self.err_stream, "Warning: {}", nfe);
        }
        Ok(make_date_to_rate_map(res.rates))
    }
}

// Used by both unit and integration tests
pub mod testlib {
    use std::collections::HashMap;

    use time::Date;

    use crate::fx::io::pub_testlib::MockRemoteRateLoader;
    use crate::fx::DailyRate;
    use crate::portfolio::Currency;
    use crate::util::rc::{RcRefCell, RcRefCellT};
    use crate::util::rw::WriteHandle;

    use super::RateLoader;

    pub type RemoteYearRates = RcRefCell<HashMap<(String, i32), Vec<DailyRate>>>;
    pub type RemoteRequests = RcRefCell<Vec<(String, Date, Date)>>;

    pub fn new_test_rate_loader(
        home_currency: Currency,
    ) -> (RateLoader, RemoteYearRates, RemoteRequests) {
        let remote_year_rates = RcRefCellT::new(HashMap::new());
        let requests = RcRefCellT::new(Vec::new());
        let rate_loader = RateLoader::new(
            home_currency,
            Box::new(MockRemoteRateLoader {
                remote_year_rates: remote_year_rates.clone(),
                requests: requests.clone(),
            }),
            WriteHandle::empty_write_handle(),
        );
        (rate_loader, remote_year_rates, requests)
    }
}
