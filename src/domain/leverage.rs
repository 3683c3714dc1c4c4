//! Leverage, position direction and per-market leverage caps.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Leverage multiplier of a spot position, always `>= 1`.
///
/// Fractional values are allowed (`1.5x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Leverage(Decimal);

impl Leverage {
    /// Unlevered position.
    pub const ONE: Self = Self(Decimal::ONE);

    /// Create a leverage, rejecting values below 1.
    pub fn try_new(value: Decimal) -> Result<Self, DomainError> {
        if value < Decimal::ONE {
            return Err(DomainError::InvalidLeverage { value });
        }
        Ok(Self(value.normalize()))
    }

    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Whole levels from 1x up to `max`, inclusive.
    pub fn sweep(max: Decimal) -> Vec<Self> {
        let mut levels = Vec::new();
        let mut level = Decimal::ONE;
        while level <= max {
            levels.push(Self(level));
            level += Decimal::ONE;
        }
        levels
    }
}

impl Default for Leverage {
    fn default() -> Self {
        Self::ONE
    }
}

impl TryFrom<Decimal> for Leverage {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::try_new(value)
    }
}

impl From<Leverage> for Decimal {
    fn from(leverage: Leverage) -> Self {
        leverage.0
    }
}

impl FromStr for Leverage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches(['x', 'X']);
        let value = Decimal::from_str(trimmed).map_err(|_| DomainError::UnknownVariant {
            kind: "leverage",
            value: s.to_string(),
            expected: "a decimal >= 1 such as 2 or 1.5x",
        })?;
        Self::try_new(value)
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

/// Side of the spot leg.
///
/// Long lends the asset and borrows against it; short borrows the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum leverage a lending market allows, per direction.
///
/// A missing cap means the market imposes no limit of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeverageCaps {
    #[serde(default)]
    pub long: Option<Decimal>,
    #[serde(default)]
    pub short: Option<Decimal>,
}

impl LeverageCaps {
    pub const fn cap(&self, direction: Direction) -> Option<Decimal> {
        match direction {
            Direction::Long => self.long,
            Direction::Short => self.short,
        }
    }

    /// Tightest cap across two markets that form one position.
    ///
    /// Caps below 1 are floored at 1 so a misconfigured market never
    /// forbids an unlevered position.
    pub fn effective(direction: Direction, legs: &[LeverageCaps]) -> Option<Decimal> {
        legs.iter()
            .filter_map(|caps| caps.cap(direction))
            .min()
            .map(|cap| cap.max(Decimal::ONE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_leverage_below_one() {
        assert!(Leverage::try_new(dec!(0.99)).is_err());
        assert!(Leverage::try_new(dec!(1)).is_ok());
    }

    #[test]
    fn sweep_stops_at_the_whole_level_below_max() {
        let levels: Vec<_> = Leverage::sweep(dec!(3.5)).into_iter().map(Leverage::value).collect();
        assert_eq!(levels, vec![dec!(1), dec!(2), dec!(3)]);
        assert!(Leverage::sweep(dec!(0.5)).is_empty());
    }

    #[test]
    fn parses_with_optional_suffix() {
        assert_eq!("3".parse::<Leverage>().unwrap().value(), dec!(3));
        assert_eq!("1.5x".parse::<Leverage>().unwrap().value(), dec!(1.5));
        assert!("abc".parse::<Leverage>().is_err());
    }

    #[test]
    fn effective_cap_takes_the_tightest_leg() {
        let asset = LeverageCaps { long: Some(dec!(5)), short: None };
        let quote = LeverageCaps { long: Some(dec!(3)), short: Some(dec!(2)) };

        assert_eq!(LeverageCaps::effective(Direction::Long, &[asset, quote]), Some(dec!(3)));
        assert_eq!(LeverageCaps::effective(Direction::Short, &[asset, quote]), Some(dec!(2)));
        assert_eq!(LeverageCaps::effective(Direction::Short, &[asset]), None);
    }

    #[test]
    fn effective_cap_is_floored_at_one() {
        let caps = LeverageCaps { long: Some(dec!(0.5)), short: None };
        assert_eq!(LeverageCaps::effective(Direction::Long, &[caps]), Some(dec!(1)));
    }
}
