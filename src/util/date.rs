pub use time::Date;
use time::{macros::format_description, Duration, UtcOffset};

pub type StaticDateFormat<'a> =
    &'static [time::format_description::BorrowedFormatItem<'a>];
pub type DynDateFormat = time::format_description::OwnedFormatItem;

pub const STANDARD_DATE_FORMAT: StaticDateFormat =
    format_description!("[year]-[month]-[day]");

pub fn parse_standard_date(date_str: &str) -> Result<Date, time::error::Parse> {
    Date::parse(date_str, STANDARD_DATE_FORMAT)
}

pub fn parse_dyn_date_format(fmt: &str) -> Result<DynDateFormat, String> {
    // The documentation recommends version 2
    const VERSION: usize = 2;
    time::format_description::parse_owned::<VERSION>(fmt)
        .map_err(|e| format!("{}", e))
}

pub fn parse_date(
    date_str: &str,
    fmt: &Option<DynDateFormat>,
) -> Result<Date, time::error::Parse> {
    match fmt {
        Some(fmt_) => Date::parse(date_str, &fmt_),
        None => parse_standard_date(date_str),
    }
}

/// Calendar-day offset, saturating at the representable range.
pub fn add_days(d: Date, days: i64) -> Date {
    d.saturating_add(Duration::days(days))
}

pub fn sub_days(d: Date, days: i64) -> Date {
    d.saturating_sub(Duration::days(days))
}

// This is a (possibly unsafe, but no worse than chrono's Local::now) way
// to get the current system UtcOffset of local timezone.
// Using UtcOffset::current_local_offset is apparently unsafe on Linux,
// and will return an error if used without enabling some "unsafe" feature.
pub fn local_utc_offset() -> Result<UtcOffset, time::error::ComponentRange> {
    let now = chrono::offset::Local::now();
    let offset = now.offset();
    UtcOffset::from_whole_seconds(-1 * offset.utc_minus_local())
}

// Used by both unit and integration tests
pub mod pub_testlib {
    use time::{Date, Duration, Month};

    pub fn doy_date(year: u32, day: i64) -> Date {
        Date::from_calendar_date(year as i32, Month::January, 1)
            .unwrap()
            .saturating_add(Duration::days(day))
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, Month};

    use super::{add_days, parse_date, parse_dyn_date_format, parse_standard_date, sub_days};

    #[test]
    fn test_parse() {
        let d = parse_standard_date("2023-01-21");
        assert_eq!(
            d.unwrap(),
            Date::from_calendar_date(2023, Month::January, 21).unwrap()
        );

        let d = parse_standard_date("2023-01-41");
        assert!(d.is_err());
    }

    #[test]
    fn test_parse_custom_format() {
        let fmt = Some(parse_dyn_date_format("[day]/[month]/[year]").unwrap());
        assert_eq!(
            parse_date("21/01/2023", &fmt).unwrap(),
            Date::from_calendar_date(2023, Month::January, 21).unwrap()
        );
        assert!(parse_date("2023-01-21", &fmt).is_err());
        assert!(parse_dyn_date_format("[notacomponent]").is_err());
    }

    #[test]
    fn test_day_arithmetic() {
        let d = parse_standard_date("2024-02-15").unwrap();
        assert_eq!(add_days(d, 30), parse_standard_date("2024-03-16").unwrap());
        assert_eq!(sub_days(d, 30), parse_standard_date("2024-01-16").unwrap());
        assert_eq!(add_days(Date::MAX, 1), Date::MAX);
    }
}
