use std::borrow::BorrowMut;
use std::collections::{HashMap, HashSet};
use std::io::{Read, Write};
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::portfolio::bookkeeping;
use crate::portfolio::csv_common::CsvCol;
use crate::portfolio::{CsvTx, Currency, TxAction};
use crate::util::rw::{DescribedReader, WriteHandle};
use crate::write_errln;

type Error = String;

fn parse_csv_action(value: &str) -> Result<TxAction, Error> {
    match value.trim().to_lowercase().as_str() {
        "buy" | "purchase" => Ok(TxAction::Purchase),
        "sell" | "sale" => Ok(TxAction::Sale),
        _ => Err(format!("Invalid action '{value}'")),
    }
}

fn csvtx_from_csv_values(
    mut values: HashMap<&str, String>,
    read_index: u32,
    parse_options: &TxCsvParseOptions,
) -> Result<CsvTx, Error> {
    let parse_decimal = |value: &str, field_name: &str| {
        Decimal::from_str(value).map_err(|e| {
            format!(
                "Failed to parse number for {} ('{}'): {}",
                field_name, value, e
            )
        })
    };

    let parse_date =
        |s: &str| crate::util::date::parse_date(s, &parse_options.date_format);

    Ok(CsvTx {
        date: match values.remove(CsvCol::DATE) {
            Some(s) => Some(parse_date(&s).map_err(|e| {
                format!("Failed to parse {} \"{}\": {}", CsvCol::DATE, s, e)
            })?),
            None => None,
        },
        action: match values.remove(CsvCol::ACTION) {
            Some(s) => Some(parse_csv_action(&s)?),
            None => None,
        },
        shares: match values.remove(CsvCol::SHARES) {
            Some(s) => Some(parse_decimal(&s, CsvCol::SHARES)?),
            None => None,
        },
        amount_per_share: match values.remove(CsvCol::AMOUNT_PER_SHARE) {
            Some(s) => Some(parse_decimal(&s, CsvCol::AMOUNT_PER_SHARE)?),
            None => None,
        },
        commission: match values.remove(CsvCol::COMMISSION) {
            Some(s) => Some(parse_decimal(&s, CsvCol::COMMISSION)?),
            None => None,
        },
        currency: values.remove(CsvCol::TX_CURR).map(|s| Currency::new(&s)),
        curr_to_local_exchange_rate: match values.remove(CsvCol::TX_FX) {
            Some(s) => Some(parse_decimal(&s, CsvCol::TX_FX)?),
            None => None,
        },
        memo: values.remove(CsvCol::MEMO),
        read_index,
    })
}

pub struct TxCsvParseOptions {
    pub date_format: Option<crate::util::date::DynDateFormat>,
}

impl Default for TxCsvParseOptions {
    fn default() -> Self {
        Self { date_format: None }
    }
}

/// Reads the records of one csv file.
///
/// Each returned CsvTx gets a read_index, counting up from
/// initial_global_read_index, so that records from several files keep a
/// stable order.
/// A value which cannot be parsed fails the whole file, reported as a
/// malformed record at the row number of the file.
pub fn parse_tx_csv(
    desc_reader: &mut DescribedReader,
    initial_global_read_index: u32,
    parse_options: &TxCsvParseOptions,
    err_stream: &mut WriteHandle,
) -> Result<Vec<CsvTx>, Error> {
    let mut reader_box = desc_reader.reader().map_err(|e| e.to_string())?;
    let reader: &mut dyn Read = reader_box.borrow_mut();
    let mut csv_r = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let csv_desc = desc_reader.desc();

    let mut col_index_to_name: HashMap<usize, &'static str> = HashMap::new();
    let mut found_col_names: HashSet<&'static str> = HashSet::new();
    let col_names = CsvCol::get_csv_cols();

    let headers_res = csv_r
        .headers()
        .map_err(|e| format!("Error in csv headers of {csv_desc}: {e}"))?;
    for (i, col) in headers_res.iter().enumerate() {
        let lower_col = col.to_lowercase();
        let san_col = lower_col.trim();
        match col_names.get(san_col) {
            Some(&static_str) => {
                col_index_to_name.insert(i, static_str);
                found_col_names.insert(static_str);
            }
            None => {
                write_errln!(
                    err_stream,
                    "Warning: Unrecognized column in {csv_desc}: {san_col}"
                );
            }
        }
    }
    // Finalize these
    let col_index_to_name = col_index_to_name;

    let missing_cols: Vec<&str> = CsvCol::required_cols()
        .into_iter()
        .filter(|c| !found_col_names.contains(c))
        .collect();
    if !missing_cols.is_empty() {
        return Err(format!(
            "{} is missing required columns: {}",
            csv_desc,
            missing_cols.join(", ")
        ));
    }

    let mut txs = Vec::<CsvTx>::new();
    let mut global_row_index = initial_global_read_index;

    for (i, record_res) in csv_r.records().enumerate() {
        // Start at 1 for the user, and include header.
        let row_num = i + 2;
        let record = record_res.map_err(|e| {
            format!("Error reading csv record in {csv_desc} at row {row_num}: {e}")
        })?;

        let mut tx_values = HashMap::<&'static str, String>::new();
        for (i, col_val) in record.iter().enumerate() {
            if col_val.trim().is_empty() {
                continue;
            }
            // Unrecognized columns were already warned about.
            if let Some(&col_name) = col_index_to_name.get(&i) {
                tx_values.insert(col_name, col_val.trim().to_string());
            }
        }

        let tx = csvtx_from_csv_values(tx_values, global_row_index, parse_options)
            .map_err(|reason| {
                let e = bookkeeping::Error::MalformedRecord { index: row_num, reason };
                format!("Error in {csv_desc}: {e}")
            })?;
        txs.push(tx);
        global_row_index += 1;
    }

    tracing::debug!("parse_tx_csv: read {} records from {}", txs.len(), csv_desc);
    Ok(txs)
}
