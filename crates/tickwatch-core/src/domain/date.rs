use std::fmt::{Display, Formatter};

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::Date;

use crate::ValidationError;

/// Calendar date of a daily bar, written `YYYY-MM-DD` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TradingDate(Date);

impl TradingDate {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), format_description!("[year]-[month]-[day]"))
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }
}

impl Display for TradingDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let date = self.0;
        write!(
            f,
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        )
    }
}

impl Serialize for TradingDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TradingDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_zero_padding() {
        let date = TradingDate::parse("2024-03-05").expect("date");
        assert_eq!(date.to_string(), "2024-03-05");
    }

    #[test]
    fn orders_chronologically() {
        let earlier = TradingDate::parse("2023-12-29").expect("date");
        let later = TradingDate::parse("2024-01-02").expect("date");
        assert!(earlier < later);
    }

    #[test]
    fn rejects_timestamps() {
        assert!(matches!(
            TradingDate::parse("2024-03-05T00:00:00Z"),
            Err(ValidationError::InvalidDate { .. })
        ));
    }
}
