//! Date and time formats used by the provider: `DD/MM/YYYY` and `HH:MM`.

use jiff::civil::{Date, Time};

pub fn parse_date(value: &str) -> Option<Date> {
    let mut parts = value.trim().split('/');
    let day = fixed_digits(parts.next()?, 2)?;
    let month = fixed_digits(parts.next()?, 2)?;
    let year = fixed_digits(parts.next()?, 4)?;

    if parts.next().is_some() {
        return None;
    }

    Date::new(i16::try_from(year).ok()?, i8::try_from(month).ok()?, i8::try_from(day).ok()?).ok()
}

pub fn parse_time(value: &str) -> Option<Time> {
    let mut parts = value.trim().split(':');
    let hour = fixed_digits(parts.next()?, 2)?;
    let minute = fixed_digits(parts.next()?, 2)?;

    if parts.next().is_some() {
        return None;
    }

    Time::new(i8::try_from(hour).ok()?, i8::try_from(minute).ok()?, 0, 0).ok()
}

pub fn format_date(date: Date) -> String {
    format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year())
}

pub fn format_time(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

fn fixed_digits(value: &str, width: usize) -> Option<u16> {
    if value.len() != width || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    value.parse().ok()
}

pub mod date {
    use jiff::civil::Date;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let value = String::deserialize(deserializer)?;
        super::parse_date(&value).ok_or_else(|| de::Error::custom(format!("invalid DD/MM/YYYY date [{value}]")))
    }
}

pub mod time {
    use jiff::civil::Time;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Time, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(*time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Time, D::Error> {
        let value = String::deserialize(deserializer)?;
        super::parse_time(&value).ok_or_else(|| de::Error::custom(format!("invalid HH:MM time [{value}]")))
    }
}
