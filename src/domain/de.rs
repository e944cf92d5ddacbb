//! Lenient deserializers for the API's decimal and date fields.
//!
//! Decimal columns arrive as JSON strings (`"12.50"`) from the server's serializer but as
//! numbers from aggregate endpoints, so both are accepted.

use serde::{Deserialize, Deserializer, de};
use time::Date;
use time::format_description::StaticFormatDescription;
use time::format_description::well_known::Iso8601;
use time::macros::format_description;

const ISO_DATE: StaticFormatDescription = format_description!("[year]-[month]-[day]");

time::serde::format_description!(pub(crate) iso_date, Date, ISO_DATE);

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    String(String),
}

fn parse_decimal<E: de::Error>(raw: NumberOrString) -> Result<f64, E> {
    match raw {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) if s.trim().is_empty() => Ok(0.0),
        NumberOrString::String(s) => {
            s.trim().parse::<f64>().map_err(|_| E::custom(format!("invalid decimal: {s}")))
        }
    }
}

pub(crate) fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Option::<NumberOrString>::deserialize(deserializer)?.map_or(Ok(0.0), parse_decimal)
}

pub(crate) fn opt_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Date>, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => parse_date(s.trim()).map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

/// Parses a `YYYY-MM-DD` calendar date, also accepting a full timestamp and keeping its date.
pub(crate) fn parse_date(s: &str) -> Result<Date, time::error::Parse> {
    let date_part = s.split_once('T').map_or(s, |(d, _)| d);
    Date::parse(date_part, &Iso8601::DATE)
}

/// `2026-10-16`, the form the API expects in query strings.
pub(crate) fn format_iso_date(date: Date) -> String {
    date.format(ISO_DATE).unwrap_or_else(|_| date.to_string())
}
