//! Display intervals.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::rate::HOURS_PER_YEAR;

/// Horizon a per-hour rate is scaled to for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    #[default]
    OneHour,
    FourHours,
    EightHours,
    OneDay,
    OneYear,
}

impl Interval {
    pub const ALL: [Interval; 5] = [
        Self::OneHour,
        Self::FourHours,
        Self::EightHours,
        Self::OneDay,
        Self::OneYear,
    ];

    pub const fn hour_count(self) -> u32 {
        match self {
            Self::OneHour => 1,
            Self::FourHours => 4,
            Self::EightHours => 8,
            Self::OneDay => 24,
            Self::OneYear => HOURS_PER_YEAR,
        }
    }

    pub fn hours(self) -> Decimal {
        Decimal::from(self.hour_count())
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::EightHours => "8h",
            Self::OneDay => "24h",
            Self::OneYear => "1y",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Interval {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" | "1" => Ok(Self::OneHour),
            "4h" | "4" => Ok(Self::FourHours),
            "8h" | "8" => Ok(Self::EightHours),
            "24h" | "1d" | "24" => Ok(Self::OneDay),
            "1y" | "8760h" | "8760" => Ok(Self::OneYear),
            _ => Err(DomainError::UnknownVariant {
                kind: "interval",
                value: s.to_string(),
                expected: "1h, 4h, 8h, 24h, 1y",
            }),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.label().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labels_and_aliases() {
        assert_eq!("24h".parse::<Interval>().unwrap(), Interval::OneDay);
        assert_eq!("1D".parse::<Interval>().unwrap(), Interval::OneDay);
        assert_eq!("1y".parse::<Interval>().unwrap(), Interval::OneYear);
        assert!("2h".parse::<Interval>().is_err());
    }

    #[test]
    fn one_year_is_8760_hours() {
        assert_eq!(Interval::OneYear.hour_count(), 8760);
    }

    #[test]
    fn labels_round_trip_through_parse() {
        for interval in Interval::ALL {
            assert_eq!(interval.label().parse::<Interval>().unwrap(), interval);
        }
    }
}
