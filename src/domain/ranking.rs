//! Interval scaling and ordering of opportunities.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tracing::warn;

use super::error::DomainError;
use super::exclusion::{SkipReason, SkippedScenario};
use super::interval::Interval;
use super::opportunity::Opportunity;
use super::rate::HOURS_PER_YEAR;

/// How ranked opportunities are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Most negative net cost (largest yield) first.
    #[default]
    MostFavorable,
    /// Largest absolute rate first, regardless of sign.
    Magnitude,
    /// Alphabetical by token.
    Token,
}

impl SortKey {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MostFavorable => "most-favorable",
            Self::Magnitude => "magnitude",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "most-favorable" | "favorable" | "net" => Ok(Self::MostFavorable),
            "magnitude" | "abs" => Ok(Self::Magnitude),
            "token" => Ok(Self::Token),
            _ => Err(DomainError::UnknownVariant {
                kind: "sort key",
                value: s.to_string(),
                expected: "most-favorable, magnitude, token",
            }),
        }
    }
}

/// An opportunity with its rate scaled to a display interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedOpportunity {
    pub opportunity: Opportunity,
    pub interval: Interval,
    /// `net_rate_per_hour * interval hours`, as a fraction.
    pub scaled_rate: Decimal,
}

impl RankedOpportunity {
    /// Scale `opportunity` to `interval`.
    ///
    /// # Errors
    /// [`DomainError::Overflow`] when the scaled, percentage or annualized
    /// figure leaves the Decimal range.
    pub fn new(opportunity: Opportunity, interval: Interval) -> Result<Self, DomainError> {
        let scaled_rate = scale(opportunity.net_rate_per_hour(), interval)?;
        Ok(Self {
            opportunity,
            interval,
            scaled_rate,
        })
    }

    /// Scaled rate as a percentage.
    pub fn percent(&self) -> Decimal {
        self.scaled_rate.saturating_mul(Decimal::ONE_HUNDRED)
    }

    /// Annualized magnitude of the net rate, in percent.
    pub fn apy_percent(&self) -> Decimal {
        annualized_percent(self.opportunity.net_rate_per_hour()).unwrap_or(Decimal::MAX)
    }

    /// Negative net rate means the position earns.
    pub fn is_yield(&self) -> bool {
        self.scaled_rate.is_sign_negative() && !self.scaled_rate.is_zero()
    }
}

/// `net_per_hour` scaled to `interval`, provided every display figure
/// derived from it stays representable.
fn scale(net_per_hour: Decimal, interval: Interval) -> Result<Decimal, DomainError> {
    let scaled = net_per_hour
        .checked_mul(interval.hours())
        .ok_or(DomainError::Overflow {
            operation: "interval scaling",
        })?;
    if scaled.checked_mul(Decimal::ONE_HUNDRED).is_none() || annualized_percent(net_per_hour).is_none() {
        return Err(DomainError::Overflow {
            operation: "percentage conversion",
        });
    }
    Ok(scaled)
}

fn annualized_percent(net_per_hour: Decimal) -> Option<Decimal> {
    net_per_hour
        .abs()
        .checked_mul(Decimal::from(HOURS_PER_YEAR))?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Ranked opportunities, plus those that could not be scaled.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    pub ranked: Vec<RankedOpportunity>,
    pub overflowed: Vec<SkippedScenario>,
}

/// Scale every opportunity to `interval` and order by `sort`.
///
/// Scaling is a plain multiplication; no compounding. Ties fall back to
/// token id then scenario so the order is fully deterministic. An
/// opportunity whose scaled rate overflows lands in
/// [`Ranking::overflowed`] instead.
pub fn rank(opportunities: Vec<Opportunity>, interval: Interval, sort: SortKey) -> Ranking {
    let mut ranking = Ranking::default();
    for opportunity in opportunities {
        match scale(opportunity.net_rate_per_hour(), interval) {
            Ok(scaled_rate) => ranking.ranked.push(RankedOpportunity {
                opportunity,
                interval,
                scaled_rate,
            }),
            Err(err) => {
                warn!(
                    token = %opportunity.token_id(),
                    scenario = %opportunity.scenario(),
                    error = %err,
                    "Dropping opportunity that cannot be scaled"
                );
                ranking.overflowed.push(SkippedScenario::from_opportunity(
                    &opportunity,
                    SkipReason::InvalidResult { reason: err.to_string() },
                ));
            }
        }
    }

    ranking
        .ranked
        .sort_by(|a, b| primary(a, b, sort).then_with(|| tie_break(a, b)));
    ranking
}

fn primary(a: &RankedOpportunity, b: &RankedOpportunity, sort: SortKey) -> Ordering {
    match sort {
        SortKey::MostFavorable => a.scaled_rate.cmp(&b.scaled_rate),
        SortKey::Magnitude => b.scaled_rate.abs().cmp(&a.scaled_rate.abs()),
        SortKey::Token => Ordering::Equal,
    }
}

fn tie_break(a: &RankedOpportunity, b: &RankedOpportunity) -> Ordering {
    let (a, b) = (&a.opportunity, &b.opportunity);
    a.token_id()
        .cmp(b.token_id())
        .then_with(|| a.scenario().cmp(&b.scenario()))
        .then_with(|| a.direction().cmp(&b.direction()))
        .then_with(|| a.spot_venue().cmp(&b.spot_venue()))
        .then_with(|| a.perp_venues().cmp(b.perp_venues()))
}
