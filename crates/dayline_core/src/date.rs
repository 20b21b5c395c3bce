//! Calendar-date parsing shared by every date-keyed kind.
//!
//! Clients send dates either as `YYYY-MM-DD` or as a full RFC 3339
//! timestamp; only the date part is kept. Dates always serialize as
//! `YYYY-MM-DD`.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serializer};

const FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date from either accepted form.
pub fn parse(input: &str) -> CoreResult<NaiveDate> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, FORMAT) {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|at| at.date_naive())
        .map_err(|_| CoreError::InvalidDate(input.to_string()))
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format(date: &NaiveDate) -> String {
    date.format(FORMAT).to_string()
}

/// Serializes a date as `YYYY-MM-DD`.
pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format(date))
}

/// Deserializes a date from either accepted form.
pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse(&raw).map_err(serde::de::Error::custom)
}

/// Same as the parent module, for optional dates. Empty strings read as `None`.
pub mod option {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serializes an optional date.
    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_str(&super::format(date)),
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional date.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => super::parse(&raw)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_dates() {
        let date = parse("2024-02-29").unwrap();
        assert_eq!(format(&date), "2024-02-29");
    }

    #[test]
    fn parses_rfc3339_and_keeps_date_part() {
        let date = parse("2024-05-06T23:15:00+02:00").unwrap();
        assert_eq!(format(&date), "2024-05-06");
        let date = parse("2024-05-06T00:00:00Z").unwrap();
        assert_eq!(format(&date), "2024-05-06");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(parse("06/05/2024"), Err(CoreError::InvalidDate(_))));
        assert!(parse("2024-13-01").is_err());
    }
}
