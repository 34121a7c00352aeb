use std::path::PathBuf;

use clap::Parser;

use crate::app::{run_acb_app_to_console, Options};
use crate::portfolio::csv_common::CsvCol;
use crate::portfolio::Currency;
use crate::util::date::parse_dyn_date_format;
use crate::util::rw::{DescribedReader, WriteHandle};

const ABOUT: &str = "Capital gains calculator, using a pooled adjusted cost base (ACB)";

fn get_long_about() -> String {
    format!("\
A cli tool which calculates the realized capital gains from the buys and sells
of a single security, using a pooled adjusted cost base (ACB).

Losses on sales with a neighbouring transaction within 30 days (before or after)
are treated as superficial. The loss is denied, and added back into the ACB.

Transactions can be in other currencies. Daily exchange rates are downloaded from
the Bank of Canada when not provided in the CSV.

Each CSV provided should contain a header with these column names:
{}
The commission, currency, exchange rate and memo columns are optional.

Exchange rates are always provided to be multiplied with the given amount to produce
the equivalent value in the home currency.",
        CsvCol::export_order_cols().join(", "))
}

#[derive(Parser, Debug)]
#[command(version = crate::app::ACB_GAINS_APP_VERSION,
          about = ABOUT, long_about = get_long_about())]
pub struct Args {
    #[arg(required = true)]
    pub csv_files: Vec<String>,

    /// Print verbose output
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Format of how dates appear in the csv file.
    /// The default is "[year]-[month]-[day]".
    ///
    /// See https://time-rs.github.io/book/api/format-description.html
    #[arg(long)]
    pub date_fmt: Option<String>,

    /// The currency gains are calculated in.
    #[arg(long, default_value = "CAD")]
    pub home_currency: String,

    /// Print all digits in output values
    #[arg(long, default_value_t = false)]
    pub print_full_values: bool,

    /// Write the report as JSON to stdout, instead of tables.
    #[arg(long, default_value_t = false, conflicts_with = "csv_output_dir")]
    pub json: bool,

    /// Write output as CSV to the specified directory.
    #[arg(short = 'd', long)]
    pub csv_output_dir: Option<String>,
}

pub fn args_to_options(args: &Args) -> Result<Options, String> {
    let date_format = match &args.date_fmt {
        Some(fmt) => Some(
            parse_dyn_date_format(fmt).map_err(|e| format!("Invalid --date-fmt: {e}"))?,
        ),
        None => None,
    };

    let home_currency = Currency::new(&args.home_currency);

    Ok(Options {
        render_full_dollar_values: args.print_full_values,
        home_currency,
        date_format,
        csv_output_dir: args.csv_output_dir.clone(),
        json_output: args.json,
    })
}

/// Returns the process exit code.
#[cfg(feature = "http_standalone")]
pub fn command_main() -> i32 {
    use std::io::Write;

    use crate::fx::io::JsonRemoteRateLoader;
    use crate::util::http::standalone::StandaloneAppRequester;

    let args = Args::parse();

    crate::log::set_verbose(args.verbose);
    crate::tracing::setup_tracing();
    tracing::debug!("command_main: {:?}", args);

    let mut err_printer = WriteHandle::stderr_write_handle();

    let options = match args_to_options(&args) {
        Ok(o) => o,
        Err(e) => {
            crate::write_errln!(err_printer, "{}", e);
            return 2;
        }
    };

    let csv_file_readers = args
        .csv_files
        .iter()
        .map(|f| DescribedReader::from_file_path(PathBuf::from(f)))
        .collect();

    let remote_loader =
        Box::new(JsonRemoteRateLoader::new(StandaloneAppRequester::new_boxed()));

    let res = async_std::task::block_on(run_acb_app_to_console(
        csv_file_readers, options, remote_loader, err_printer));
    match res {
        Ok(()) => 0,
        Err(()) => 1,
    }
}
