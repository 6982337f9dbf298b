//! Fixed-width date-time encoding for transaction dates.
//!
//! Transaction dates are stored as TEXT in the form
//! `YYYY-MM-DD HH:MM:SS.ffffff`. Every value has the same width, so SQLite's
//! string comparison orders them chronologically and `BETWEEN` can be used
//! for date range filters.

use rusqlite::{Row, types::Type};
use time::{
    Date, PrimitiveDateTime, format_description::BorrowedFormatItem,
    macros::{format_description, time},
};

const MICROSECOND_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
);
const SECOND_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Format `date_time` in the fixed-width storage format, e.g.
/// "2024-01-15 09:30:00.000000".
pub fn format_timestamp(date_time: PrimitiveDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.{:06}",
        date_time.year(),
        u8::from(date_time.month()),
        date_time.day(),
        date_time.hour(),
        date_time.minute(),
        date_time.second(),
        date_time.microsecond(),
    )
}

/// Parse a date-time string.
///
/// Accepts the full storage format, a date-time without fractional seconds
/// ("2024-01-15 09:30:00") or a plain date ("2024-01-15"), which is read as
/// midnight.
pub fn parse_timestamp(text: &str) -> Result<PrimitiveDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(text, MICROSECOND_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(text, SECOND_FORMAT))
        .or_else(|_| Date::parse(text, DATE_FORMAT).map(start_of_day))
}

/// Parse a plain date string, e.g. "2024-01-15".
pub fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text, DATE_FORMAT)
}

/// Drop any precision finer than a microsecond, which the storage format
/// cannot represent.
pub fn truncate_to_microseconds(date_time: PrimitiveDateTime) -> PrimitiveDateTime {
    // The current microsecond is always a valid replacement.
    date_time
        .replace_microsecond(date_time.microsecond())
        .unwrap_or(date_time)
}

/// The first instant of `date`, 00:00:00.
pub fn start_of_day(date: Date) -> PrimitiveDateTime {
    date.midnight()
}

/// The last instant of `date` included by date range filters, 23:59:59.
pub fn end_of_day(date: Date) -> PrimitiveDateTime {
    date.with_time(time!(23:59:59))
}

/// Read a date-time stored by [format_timestamp] from column `index`.
pub fn read_timestamp(row: &Row, index: usize) -> Result<PrimitiveDateTime, rusqlite::Error> {
    let text: String = row.get(index)?;

    parse_timestamp(&text).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error))
    })
}

/// Serde adapter for [PrimitiveDateTime] fields using [format_timestamp] and
/// [parse_timestamp].
pub mod serde_timestamp {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    use super::{format_timestamp, parse_timestamp};

    pub fn serialize<S: Serializer>(
        value: &PrimitiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<PrimitiveDateTime, D::Error> {
        let text = String::deserialize(deserializer)?;

        parse_timestamp(&text).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for [Date] fields in the form "2024-01-15".
pub mod serde_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::parse_date;

    pub fn serialize<S: Serializer>(value: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!(
            "{:04}-{:02}-{:02}",
            value.year(),
            u8::from(value.month()),
            value.day()
        ))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;

        parse_date(&text).map_err(serde::de::Error::custom)
    }
}
