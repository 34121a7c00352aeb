use std::collections::HashSet;

pub struct CsvCol();
impl CsvCol {
    pub const DATE: &'static str = "date";
    pub const ACTION: &'static str = "action";
    pub const SHARES: &'static str = "shares";
    pub const AMOUNT_PER_SHARE: &'static str = "amount/share";
    pub const COMMISSION: &'static str = "commission";
    pub const TX_CURR: &'static str = "currency";
    pub const TX_FX: &'static str = "exchange rate";
    pub const MEMO: &'static str = "memo";

    pub fn get_csv_cols() -> HashSet<&'static str> {
        HashSet::from(CsvCol::export_order_cols())
    }

    pub fn export_order_cols() -> [&'static str; 8] {
        [
            CsvCol::DATE,
            CsvCol::ACTION,
            CsvCol::SHARES,
            CsvCol::AMOUNT_PER_SHARE,
            CsvCol::COMMISSION,
            CsvCol::TX_CURR,
            CsvCol::TX_FX,
            CsvCol::MEMO,
        ]
    }

    /// Columns which must be present in every file.
    pub fn required_cols() -> [&'static str; 4] {
        [
            CsvCol::DATE,
            CsvCol::ACTION,
            CsvCol::SHARES,
            CsvCol::AMOUNT_PER_SHARE,
        ]
    }
}
