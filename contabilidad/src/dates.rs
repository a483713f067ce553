//! Calendar helpers shared by the detector, the breakdowns and the wire types.
//!
//! Dates travel as plain `YYYY-MM-DD` strings both on the backend API and in
//! the local store.

use time::{macros::format_description, Date, Month, OffsetDateTime};

/// Today's date in the local timezone, falling back to UTC when the local
/// offset cannot be determined.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month() as u8,
        date.day()
    )
}

/// Parses a `YYYY-MM-DD` date. Anything after the tenth character (a time
/// component sent by some backends) is ignored.
pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    Date::parse(date_part, format_description!("[year]-[month]-[day]"))
}

pub fn days_in_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if time::util::is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

pub fn month_start(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

pub fn month_end(date: Date) -> Date {
    let last = days_in_month(date.year(), date.month());
    date.replace_day(last).unwrap_or(date)
}

/// Serde adapter for `YYYY-MM-DD` dates.
pub mod iso_date {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(de::Error::custom)
    }

    pub mod option {
        use serde::{de, Deserialize, Deserializer, Serializer};
        use time::Date;

        pub fn serialize<S: Serializer>(
            date: &Option<Date>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => serializer.serialize_some(&super::super::format_date(*date)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Date>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if raw.trim().is_empty() => Ok(None),
                Some(raw) => super::super::parse_date(&raw)
                    .map(Some)
                    .map_err(de::Error::custom),
                None => Ok(None),
            }
        }
    }
}
