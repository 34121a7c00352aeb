use crate::fx::io::RateLoader;
use crate::portfolio::{bookkeeping, CsvTx, Currency, Tx};

type Error = String;

// Takes CsvTxs parsed from a CSV, and loads any missing exchange
// rates directly into them.
// Only Txs in a currency other than the home currency, and without an
// explicit rate, need one loaded.
pub async fn load_tx_rates(
    csv_txs: &mut Vec<CsvTx>,
    rate_loader: &mut RateLoader,
) -> Result<(), Error> {
    let home_currency = rate_loader.home_currency().clone();

    for tx in csv_txs {
        if !tx.needs_exchange_rate(&home_currency) {
            continue;
        }
        // Txs with no date are rejected as malformed later.
        let date = match tx.date {
            Some(d) => d,
            None => continue,
        };
        let currency = tx.currency_or(&home_currency);
        let rate = rate_loader
            .get_effective_rate(&currency, date)
            .await
            .map_err(|e| format!("Exchange rate error: {}", e))?;
        tx.curr_to_local_exchange_rate = Some(rate.foreign_to_local_rate);
    }

    Ok(())
}

/// Converts to home-currency Txs, sorted by date. Txs on the same date stay
/// in the order they were read.
pub fn csv_txs_to_sorted_txs(
    csv_txs: Vec<CsvTx>,
    home_currency: &Currency,
) -> Result<Vec<Tx>, bookkeeping::Error> {
    let mut txs = csv_txs
        .into_iter()
        .map(|ctx| ctx.into_tx(home_currency))
        .collect::<Result<Vec<Tx>, bookkeeping::Error>>()?;
    txs.sort();
    Ok(txs)
}
