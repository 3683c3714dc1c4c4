//! Canonical rate observations.
//!
//! A [`RateRecord`] is one rate reported by one source for one token. Its
//! value is always a signed fraction per hour: sources report in their own
//! native unit and interval, and the conversion happens exactly once, in
//! the normalizers, through [`rebase_to_hourly`].

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::ids::{TokenId, Venue};

/// Hours in a (non-leap) year, the annualization basis used by every source.
pub const HOURS_PER_YEAR: u32 = 365 * 24;

/// Largest per-hour magnitude (1000% an hour) a source may report.
pub const MAX_RATE_PER_HOUR: Decimal = Decimal::TEN;

/// Origin of a rate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// Predicted fundings feed (Hyperliquid plus the CEX venues it mirrors).
    Hyperliquid,
    /// Drift perpetual markets feed.
    Drift,
    /// Spot lending/borrowing rates.
    Lending,
    /// Staking yields of yield-bearing tokens.
    Staking,
}

impl RateSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hyperliquid => "hyperliquid",
            Self::Drift => "drift",
            Self::Lending => "lending",
            Self::Staking => "staking",
        }
    }
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rate measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateKind {
    Funding,
    Lend,
    Borrow,
    Stake,
}

impl RateKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Funding => "funding",
            Self::Lend => "lend",
            Self::Borrow => "borrow",
            Self::Stake => "stake",
        }
    }
}

impl fmt::Display for RateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The period a source's raw figure covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeInterval {
    /// A fixed number of hours (funding periods).
    Hours(u32),
    /// Annualized (APY/APR style figures).
    Annual,
}

impl NativeInterval {
    /// Length of the interval in hours.
    pub fn hours(self) -> Decimal {
        match self {
            Self::Hours(h) => Decimal::from(h),
            Self::Annual => Decimal::from(HOURS_PER_YEAR),
        }
    }
}

/// How a source's raw figure is scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    /// Plain fraction (`0.01` = 1%).
    Fraction,
    /// Percentage (`1.0` = 1%).
    Percent,
}

impl RateUnit {
    fn to_fraction(self, value: Decimal) -> Decimal {
        match self {
            Self::Fraction => value,
            Self::Percent => value / Decimal::ONE_HUNDRED,
        }
    }
}

/// Convert a raw source figure to a per-hour fraction.
///
/// # Errors
/// [`DomainError::RateOutOfRange`] when the result exceeds
/// [`MAX_RATE_PER_HOUR`] in magnitude, [`DomainError::Overflow`] for a
/// zero-length interval.
pub fn rebase_to_hourly(value: Decimal, unit: RateUnit, interval: NativeInterval) -> Result<Decimal, DomainError> {
    let per_hour = unit
        .to_fraction(value)
        .checked_div(interval.hours())
        .ok_or(DomainError::Overflow {
            operation: "rate rebasing",
        })?;
    if per_hour.abs() > MAX_RATE_PER_HOUR {
        return Err(DomainError::RateOutOfRange {
            value: per_hour,
            limit: MAX_RATE_PER_HOUR,
        });
    }
    Ok(per_hour)
}

/// One observed rate, rebased to per hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateRecord {
    pub token_id: TokenId,
    pub source: RateSource,
    pub kind: RateKind,
    pub value_per_hour: Decimal,
    /// Exchange for funding, protocol market for lend/borrow, none for stake.
    pub venue: Option<Venue>,
}

impl RateRecord {
    pub fn funding(token_id: TokenId, source: RateSource, venue: Venue, per_hour: Decimal) -> Self {
        Self {
            token_id,
            source,
            kind: RateKind::Funding,
            value_per_hour: per_hour,
            venue: Some(venue),
        }
    }

    pub fn lend(token_id: TokenId, venue: Venue, per_hour: Decimal) -> Self {
        Self {
            token_id,
            source: RateSource::Lending,
            kind: RateKind::Lend,
            value_per_hour: per_hour,
            venue: Some(venue),
        }
    }

    pub fn borrow(token_id: TokenId, venue: Venue, per_hour: Decimal) -> Self {
        Self {
            token_id,
            source: RateSource::Lending,
            kind: RateKind::Borrow,
            value_per_hour: per_hour,
            venue: Some(venue),
        }
    }

    pub fn stake(token_id: TokenId, per_hour: Decimal) -> Self {
        Self {
            token_id,
            source: RateSource::Staking,
            kind: RateKind::Stake,
            value_per_hour: per_hour,
            venue: None,
        }
    }
}
