use std::{collections::HashSet, str::FromStr};

use json::JsonValue;
use rust_decimal::Decimal;
use time::Date;

use crate::{
    fx::{CurrencyPair, DailyRate},
    util::{date, http::HttpRequester},
    verboseln,
};

const VALET_OBSERVATIONS_URL: &str = "https://www.bankofcanada.ca/valet/observations";

pub fn get_fx_json_url(pair: &CurrencyPair, start_date: Date, end_date: Date) -> String {
    format!(
        "{}/{}/json?start_date={}&end_date={}",
        VALET_OBSERVATIONS_URL,
        pair.valet_series(),
        start_date,
        end_date
    )
}

#[derive(thiserror::Error, PartialEq, Eq, Clone, Debug)]
pub enum RateFetchError {
    #[error("Error getting {pair} rates: {reason}")]
    NetworkError { pair: String, reason: String },
    #[error("No {pair} exchange rate data available from {start_date} to {end_date}")]
    EmptyResult {
        pair: String,
        start_date: Date,
        end_date: Date,
    },
    #[error("Error parsing {pair} rates: {reason}")]
    ParseError { pair: String, reason: String },
}

#[derive(Debug)]
pub struct RateParseResult {
    pub rates: Vec<DailyRate>,
    pub non_fatal_errors: Vec<String>,
}

#[async_trait::async_trait(?Send)]
pub trait RemoteRateLoader {
    /// Gets all quoted rates for pair, from start_date to end_date inclusive.
    /// A range with no quoted rates at all is an EmptyResult error.
    async fn get_remote_rates(
        &mut self,
        pair: &CurrencyPair,
        start_date: Date,
        end_date: Date,
    ) -> Result<RateParseResult, RateFetchError>;
}

const JSON_DATE_FORMAT: date::StaticDateFormat = date::STANDARD_DATE_FORMAT;

fn json_value_to_decimal(jv: &JsonValue) -> Result<Decimal, String> {
    match jv {
        JsonValue::String(v) => Decimal::from_str(v).map_err(|e| e.to_string()),
        JsonValue::Short(v) => Decimal::from_str(v.as_str()).map_err(|e| e.to_string()),
        JsonValue::Number(v) => Decimal::from_str(&v.to_string()).map_err(|e| e.to_string()),
        v => Err(format!("Value (not a number): {}", v)),
    }
}

fn json_value_to_positive_decimal(jv: &JsonValue) -> Result<Decimal, String> {
    let d = json_value_to_decimal(jv)?;
    if d.is_sign_positive() && !d.is_zero() {
        Ok(d)
    } else {
        Err(format!("Value is not positive: {}", d))
    }
}

fn json_value_to_string(jv: &JsonValue) -> Option<&str> {
    match jv {
        JsonValue::Short(v) => Some(v.as_str()),
        JsonValue::String(s) => Some(s.as_str()),
        _ => None,
    }
}

/// Parses a Valet observations response for the series of pair.
///
/// Problems with individual observations are non-fatal, and are collected
/// so the caller can warn about them.
pub fn parse_rates_json(
    json_str: &str,
    pair: &CurrencyPair,
) -> Result<RateParseResult, RateFetchError> {
    let fmt_err = |s: &str| -> Result<_, RateFetchError> {
        Err(RateFetchError::ParseError {
            pair: pair.to_string(),
            reason: s.to_string(),
        })
    };

    let json_obj = match json::parse(json_str) {
        Ok(v) => v,
        Err(e) => return fmt_err(&e.to_string()),
    };

    // BoC valet Json schema:
    // {
    //    observations: [
    //      {
    //         d: <date: string, formatted as yyyy-mm-dd>,
    //         "FXUSDCAD": { v: <value: string encoded decimal> }
    //      }
    //    ]
    // }

    let observations = match &json_obj {
        JsonValue::Object(o) => match o.get("observations") {
            Some(obs) => obs,
            None => return fmt_err("Did not find 'observations'"),
        },
        _ => return fmt_err("Root was not of type object"),
    };

    let series = pair.valet_series();
    let mut rates = Vec::new();
    let mut non_fatal_dyn: Vec<String> = vec![];
    let mut non_fatal_static: HashSet<&str> = HashSet::new();

    for v in observations.members() {
        let obs = match v {
            JsonValue::Object(o) => o,
            v => {
                non_fatal_dyn.push(format!("Non-object found in observations: {}", v));
                continue;
            }
        };
        let date_str = match obs.get("d") {
            Some(d) => match json_value_to_string(d) {
                Some(s) => s,
                None => {
                    non_fatal_dyn.push(format!(
                        "Date in rate observation of wrong type: {:?}", d));
                    continue;
                }
            },
            None => {
                non_fatal_static.insert("Rate observation missing date");
                continue;
            }
        };

        let date = match Date::parse(date_str, JSON_DATE_FORMAT) {
            Ok(date) => date,
            Err(e) => {
                non_fatal_dyn.push(format!("Failed to parse date {:?}: {}", date_str, e));
                continue;
            }
        };

        // Should look like { v: <value> }
        let obs_val = match obs.get(&series) {
            Some(JsonValue::Object(o)) => o,
            Some(v) => {
                non_fatal_dyn.push(format!(
                    "Failed to parse rate for {}: value container was not an object: {}",
                    date_str, v));
                continue;
            }
            // No rate quoted for this date.
            None => continue,
        };
        match obs_val.get("v").map(json_value_to_positive_decimal) {
            Some(Ok(r)) => rates.push(DailyRate::new(date, r)),
            Some(Err(e)) => {
                non_fatal_dyn.push(format!("Failed to parse rate for {}: {}", date_str, e));
            }
            None => {
                non_fatal_dyn.push(format!(
                    "Failed to parse rate for {}: No value (\"v\") found", date_str));
            }
        }
    }

    let mut non_fatal_errors: Vec<String> =
        Vec::from_iter(non_fatal_static.drain().map(|s| s.to_string()));
    non_fatal_errors.append(&mut non_fatal_dyn);

    Ok(RateParseResult { rates, non_fatal_errors })
}

pub struct JsonRemoteRateLoader {
    http_requester: Box<dyn HttpRequester>,
}

impl JsonRemoteRateLoader {
    pub fn new(http_requester: Box<dyn HttpRequester>) -> JsonRemoteRateLoader {
        JsonRemoteRateLoader { http_requester }
    }
}

#[async_trait::async_trait(?Send)]
impl RemoteRateLoader for JsonRemoteRateLoader {
    async fn get_remote_rates(
        &mut self,
        pair: &CurrencyPair,
        start_date: Date,
        end_date: Date,
    ) -> Result<RateParseResult, RateFetchError> {
        let url = get_fx_json_url(pair, start_date, end_date);
        verboseln!("Fetching {} exchange rates from {}", pair, url);
        tracing::debug!("JsonRemoteRateLoader::get_remote_rates {}", url);

        let text = self.http_requester.get(&url).await.map_err(|e| {
            RateFetchError::NetworkError { pair: pair.to_string(), reason: e }
        })?;

        let res = parse_rates_json(&text, pair)?;
        if res.rates.is_empty() {
            return Err(RateFetchError::EmptyResult {
                pair: pair.to_string(),
                start_date,
                end_date,
            });
        }
        Ok(res)
    }
}

// Ideally this would be marked as cfg(test), but I want integration
// tests to also have access, so it cannot be marked test-only for it
// to be accessible there.
pub mod pub_testlib {
    use std::collections::HashMap;

    use time::Date;
    use tracing::trace;

    use crate::fx::{CurrencyPair, DailyRate};
    use crate::util::rc::RcRefCell;

    use super::{RateFetchError, RateParseResult, RemoteRateLoader};

    /// Serves rates per (series, year). Also counts the requests made, so
    /// tests can check memoization.
    pub struct MockRemoteRateLoader {
        pub remote_year_rates: RcRefCell<HashMap<(String, i32), Vec<DailyRate>>>,
        pub requests: RcRefCell<Vec<(String, Date, Date)>>,
    }

    #[async_trait::async_trait(?Send)]
    impl RemoteRateLoader for MockRemoteRateLoader {
        async fn get_remote_rates(
            &mut self,
            pair: &CurrencyPair,
            start_date: Date,
            end_date: Date,
        ) -> Result<RateParseResult, RateFetchError> {
            trace!(pair = %pair, "MockRemoteRateLoader::get_remote_rates");
            self.requests.borrow_mut().push((pair.valet_series(), start_date, end_date));

            let key = (pair.valet_series(), start_date.year());
            match self.remote_year_rates.borrow().get(&key) {
                Some(rates) => Ok(RateParseResult {
                    rates: rates
                        .iter()
                        .filter(|r| r.date >= start_date && r.date <= end_date)
                        .cloned()
                        .collect(),
                    non_fatal_errors: vec![],
                }),
                None => Err(RateFetchError::EmptyResult {
                    pair: pair.to_string(),
                    start_date,
                    end_date,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use crate::fx::{CurrencyPair, DailyRate};
    use crate::portfolio::Currency;
    use crate::util::date;
    use crate::util::http::pub_testlib::CannedHttpRequester;

    use super::{
        get_fx_json_url, parse_rates_json, JsonRemoteRateLoader, RateFetchError,
        RemoteRateLoader,
    };

    fn usd_cad() -> CurrencyPair {
        CurrencyPair::new(Currency::usd(), Currency::cad())
    }

    fn dr(date_str: &str, val: Decimal) -> DailyRate {
        DailyRate::new(date::parse_standard_date(date_str).unwrap(), val)
    }

    fn d(date_str: &str) -> time::Date {
        date::parse_standard_date(date_str).unwrap()
    }

    #[test]
    fn test_url() {
        assert_eq!(
            get_fx_json_url(&usd_cad(), d("2024-01-01"), d("2024-12-31")),
            "https://www.bankofcanada.ca/valet/observations/FXUSDCAD/json?\
            start_date=2024-01-01&end_date=2024-12-31"
        );
    }

    #[test]
    fn test_parse_ok() {
        // Basic empty case
        let r = parse_rates_json("{ \"observations\": [] }", &usd_cad()).unwrap();
        assert_eq!(r.rates, vec![]);
        assert_eq!(r.non_fatal_errors, Vec::new() as Vec<String>);

        let r = parse_rates_json("
        {
           \"observations\": [
             {
                \"d\": \"2024-01-24\",
                \"FXUSDCAD\": { \"v\": \"1.3456\" },
                \"FXEURCAD\": { \"v\": \"1.4654\" }
             },
             {
                \"d\": \"2024-01-25\",
                \"FXEURCAD\": { \"v\": \"1.4655\" }
             },
             {
                \"d\": \"2024-01-26\",
                \"FXUSDCAD\": { \"v\": 1.3457 }
             }
           ]
        }
        ", &usd_cad()).unwrap();
        assert_eq!(r.non_fatal_errors, Vec::new() as Vec<String>);
        assert_eq!(r.rates, vec![
            dr("2024-01-24", dec!(1.3456)),
            dr("2024-01-26", dec!(1.3457)),
        ]);
    }

    #[test]
    fn test_parse_err() {
        let e = parse_rates_json("{", &usd_cad()).unwrap_err();
        assert!(matches!(e, RateFetchError::ParseError{..}));

        let e = parse_rates_json("[ { \"observations\": [] } ]", &usd_cad()).unwrap_err();
        assert_eq!(e.to_string(), "Error parsing USD/CAD rates: Root was not of type object");

        let e = parse_rates_json("{ \"XXXX_observations\": [] }", &usd_cad()).unwrap_err();
        assert_eq!(e.to_string(), "Error parsing USD/CAD rates: Did not find 'observations'");

        // Bad individual observations are skipped.
        let r = parse_rates_json("
        { \"observations\": [
            1234,
            { \"FXUSDCAD\": { \"v\": \"1.333\" } },
            { \"d\": \"2024-02-15\", \"FXUSDCAD\": { \"v\": \"abc\" } },
            { \"d\": \"2024-02-16\", \"FXUSDCAD\": \"1.333\" },
            { \"d\": \"2024-02-17\", \"FXUSDCAD\": { } },
            { \"d\": \"2024-02-18\", \"FXUSDCAD\": { \"v\": \"-1.2\" } },
            { \"d\": \"2024-02-19\", \"FXUSDCAD\": { \"v\": \"1.35\" } }
        ] }
        ", &usd_cad()).unwrap();
        assert_eq!(r.non_fatal_errors, vec![
            "Rate observation missing date",
            "Non-object found in observations: 1234",
            "Failed to parse rate for 2024-02-15: Invalid decimal: unknown character",
            "Failed to parse rate for 2024-02-16: value container was not an object: 1.333",
            "Failed to parse rate for 2024-02-17: No value (\"v\") found",
            "Failed to parse rate for 2024-02-18: Value is not positive: -1.2",
        ]);
        assert_eq!(r.rates, vec![dr("2024-02-19", dec!(1.35))]);
    }

    #[test]
    fn test_json_remote_loader() {
        let url = get_fx_json_url(&usd_cad(), d("2024-01-01"), d("2024-12-31"));
        let empty_url = get_fx_json_url(&usd_cad(), d("2023-01-01"), d("2023-12-31"));
        let requester = CannedHttpRequester {
            responses: HashMap::from([
                (url, Ok("{ \"observations\": [ \
                    { \"d\": \"2024-01-02\", \"FXUSDCAD\": { \"v\": \"1.3316\" } } ] }"
                    .to_string())),
                (empty_url, Ok("{ \"observations\": [] }".to_string())),
            ]),
        };
        let mut loader = JsonRemoteRateLoader::new(Box::new(requester));

        let r = async_std::task::block_on(
            loader.get_remote_rates(&usd_cad(), d("2024-01-01"), d("2024-12-31"))).unwrap();
        assert_eq!(r.rates, vec![dr("2024-01-02", dec!(1.3316))]);

        let e = async_std::task::block_on(
            loader.get_remote_rates(&usd_cad(), d("2023-01-01"), d("2023-12-31"))).unwrap_err();
        assert_eq!(e, RateFetchError::EmptyResult{
            pair: "USD/CAD".to_string(),
            start_date: d("2023-01-01"),
            end_date: d("2023-12-31"),
        });
        assert_eq!(e.to_string(),
            "No USD/CAD exchange rate data available from 2023-01-01 to 2023-12-31");

        let e = async_std::task::block_on(
            loader.get_remote_rates(&usd_cad(), d("2022-01-01"), d("2022-12-31"))).unwrap_err();
        assert!(matches!(e, RateFetchError::NetworkError{..}));
    }
}
