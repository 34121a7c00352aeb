use std::io::Write;

use crate::{
    app::outfmt::{csv::CsvWriter, json::write_report_json},
    fx::io::{RateLoader, RemoteRateLoader},
    portfolio::{
        bookkeeping::GainsEngine,
        calc_cumulative_capital_gains,
        io::{
            tx_csv::{parse_tx_csv, TxCsvParseOptions},
            tx_loader::{csv_txs_to_sorted_txs, load_tx_rates},
        },
        render::{render_gains_tables, GainsTables},
        Currency, GainsReport, Tx,
    },
    util::{date::DynDateFormat, rw::{DescribedReader, WriteHandle}},
    write_errln,
};

use super::outfmt::{model::{AcbWriter, OutputType}, text::TextWriter};

pub type Error = String;

#[derive(Debug)]
pub struct Options {
    pub render_full_dollar_values: bool,
    pub home_currency: Currency,
    pub date_format: Option<DynDateFormat>,
    pub csv_output_dir: Option<String>,
    pub json_output: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            render_full_dollar_values: false,
            home_currency: Currency::default(),
            date_format: None,
            csv_output_dir: None,
            json_output: false,
        }
    }
}

/// Reads all csv files, loads any missing exchange rates, and produces the
/// sorted, home-currency Txs.
pub async fn load_txs(
    csv_file_readers: Vec<DescribedReader>,
    options: &Options,
    remote_loader: Box<dyn RemoteRateLoader>,
    mut err_printer: WriteHandle,
) -> Result<Vec<Tx>, Error> {
    let mut rate_loader = RateLoader::new(
        options.home_currency.clone(), remote_loader, err_printer.clone());
    let parse_options = TxCsvParseOptions { date_format: options.date_format.clone() };

    let mut all_csv_txs = Vec::new();
    let mut global_read_index: u32 = 0;
    for mut csv_reader in csv_file_readers {
        let mut csv_txs = parse_tx_csv(
            &mut csv_reader, global_read_index, &parse_options, &mut err_printer)?;

        load_tx_rates(&mut csv_txs, &mut rate_loader).await
            .map_err(|e| format!("{}: {}", csv_reader.desc(), e))?;

        global_read_index += csv_txs.len() as u32;
        all_csv_txs.append(&mut csv_txs);
    }

    csv_txs_to_sorted_txs(all_csv_txs, &options.home_currency).map_err(|e| {
        format!("Converting transactions (numbered in read order across all files): {e}")
    })
}

/// Runs the whole pipeline up to the gains report.
pub async fn run_acb_app_to_report(
    csv_file_readers: Vec<DescribedReader>,
    options: &Options,
    remote_loader: Box<dyn RemoteRateLoader>,
    err_printer: WriteHandle,
) -> Result<GainsReport, Error> {
    let txs = load_txs(csv_file_readers, options, remote_loader, err_printer).await?;
    tracing::info!("run_acb_app_to_report: {} transactions loaded", txs.len());

    let mut engine = GainsEngine::new();
    engine
        .run(&txs)
        .map_err(|e| format!("Calculating gains (transactions numbered in date order): {e}"))
}

pub fn render_report(report: &GainsReport, options: &Options) -> GainsTables {
    let gains = calc_cumulative_capital_gains(&report.ledger);
    render_gains_tables(report, &gains, options.render_full_dollar_values)
}

fn write_render_result(
    name: &str,
    tables: &GainsTables,
    writer: &mut dyn AcbWriter,
) -> Result<(), Error> {
    writer
        .print_render_table(OutputType::Gains, name, &tables.ledger)
        .map_err(|e| format!("Rendering capital gains: {e}"))?;
    writer
        .print_render_table(OutputType::YearlyGains, name, &tables.yearly)
        .map_err(|e| format!("Rendering yearly capital gains: {e}"))
}

fn inputs_name(csv_file_readers: &[DescribedReader]) -> String {
    csv_file_readers
        .iter()
        .map(|r| r.desc().to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// Returned Err is for exit code determination only.
/// All errors are written to err_printer.
pub async fn run_acb_app_to_writer(
    writer: &mut dyn AcbWriter,
    csv_file_readers: Vec<DescribedReader>,
    options: &Options,
    remote_loader: Box<dyn RemoteRateLoader>,
    mut err_printer: WriteHandle,
) -> Result<GainsReport, ()> {
    let name = inputs_name(&csv_file_readers);

    let report = match run_acb_app_to_report(
        csv_file_readers, options, remote_loader, err_printer.clone()).await
    {
        Ok(r) => r,
        Err(e) => {
            write_errln!(err_printer, "[!] {}", e);
            return Err(());
        }
    };

    let tables = render_report(&report, options);
    if let Err(e) = write_render_result(&name, &tables, writer) {
        write_errln!(err_printer, "{}", e);
        return Err(());
    }
    Ok(report)
}

pub async fn run_acb_app_to_console(
    csv_file_readers: Vec<DescribedReader>,
    options: Options,
    remote_loader: Box<dyn RemoteRateLoader>,
    mut err_printer: WriteHandle,
) -> Result<(), ()> {
    if options.json_output {
        let report = match run_acb_app_to_report(
            csv_file_readers, &options, remote_loader, err_printer.clone()).await
        {
            Ok(r) => r,
            Err(e) => {
                write_errln!(err_printer, "[!] {}", e);
                return Err(());
            }
        };
        let mut out = WriteHandle::stdout_write_handle();
        return write_report_json(&mut out, &report).map_err(|e| {
            write_errln!(err_printer, "{}", e);
        });
    }

    let mut writer: Box<dyn AcbWriter> = match &options.csv_output_dir {
        Some(dir_path) => match CsvWriter::new(dir_path) {
            Ok(w) => Box::new(w),
            Err(e) => {
                write_errln!(err_printer, "{e}");
                return Err(());
            }
        },
        None => Box::new(TextWriter::new(WriteHandle::stdout_write_handle())),
    };

    run_acb_app_to_writer(
        writer.as_mut(), csv_file_readers, &options, remote_loader, err_printer)
        .await
        .map(|_| ())
}
