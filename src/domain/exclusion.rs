//! Exclusions report.
//!
//! Incomplete data is not an error: whatever could not be used in a refresh
//! is recorded here instead, so the caller can see exactly what was left
//! out and why.

use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use super::ids::{TokenId, Venue};
use super::leverage::Direction;
use super::opportunity::{Opportunity, Scenario};
use super::rate::{RateKind, RateSource};

/// A native key a source reported that the catalog does not know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedKey {
    pub source: RateSource,
    pub key: String,
}

/// A raw entry that failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedRecord {
    pub source: RateSource,
    /// Where in the payload the entry sits (index, symbol or address).
    pub locator: String,
    pub reason: String,
}

impl MalformedRecord {
    pub fn new(source: RateSource, locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source,
            locator: locator.into(),
            reason: reason.into(),
        }
    }
}

/// Why a scenario was not computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Required rate kinds are absent.
    MissingData { kinds: Vec<RateKind> },
    /// Perps-vs-perps needs funding on at least two venues.
    InsufficientVenues { found: usize },
    /// The lending market does not allow the requested leverage.
    LeverageAboveCap { cap: Decimal, requested: Decimal },
    /// Quote-framed spot leg has no quote market at the same venue.
    MissingQuoteMarket { quote: TokenId },
    /// The figures could not be combined into a usable result.
    InvalidResult {
        #[serde(rename = "detail")]
        reason: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingData { kinds } => {
                let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
                write!(f, "missing {}", names.join(", "))
            }
            Self::InsufficientVenues { found } => {
                write!(f, "funding on {found} venue(s), need 2")
            }
            Self::LeverageAboveCap { cap, requested } => {
                write!(f, "leverage {requested}x above market cap {cap}x")
            }
            Self::MissingQuoteMarket { quote } => {
                write!(f, "no {quote} market at this venue")
            }
            Self::InvalidResult { reason } => write!(f, "invalid result: {reason}"),
        }
    }
}

/// A scenario that was not computed for a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedScenario {
    pub token_id: TokenId,
    pub scenario: Scenario,
    pub venue: Option<Venue>,
    pub direction: Option<Direction>,
    pub reason: SkipReason,
}

impl SkippedScenario {
    pub fn new(token_id: TokenId, scenario: Scenario, reason: SkipReason) -> Self {
        Self {
            token_id,
            scenario,
            venue: None,
            direction: None,
            reason,
        }
    }

    /// Skip entry describing an opportunity that was dropped after building.
    pub fn from_opportunity(opportunity: &Opportunity, reason: SkipReason) -> Self {
        Self {
            token_id: opportunity.token_id().clone(),
            scenario: opportunity.scenario(),
            venue: opportunity.spot_venue().cloned(),
            direction: opportunity.direction(),
            reason,
        }
    }

    #[must_use]
    pub fn at(mut self, venue: Venue) -> Self {
        self.venue = Some(venue);
        self
    }

    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }
}

/// Everything left out of one refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExclusionReport {
    unresolved: Vec<UnresolvedKey>,
    malformed: Vec<MalformedRecord>,
    skipped: Vec<SkippedScenario>,
}

impl ExclusionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unresolved(&self) -> &[UnresolvedKey] {
        &self.unresolved
    }

    pub fn malformed(&self) -> &[MalformedRecord] {
        &self.malformed
    }

    pub fn skipped(&self) -> &[SkippedScenario] {
        &self.skipped
    }

    /// Scenarios skipped for one token.
    pub fn skipped_for<'a>(
        &'a self,
        token_id: &TokenId,
    ) -> impl Iterator<Item = &'a SkippedScenario> + 'a {
        let token_id = token_id.clone();
        self.skipped.iter().filter(move |s| s.token_id == token_id)
    }

    pub fn is_empty(&self) -> bool {
        self.unresolved.is_empty() && self.malformed.is_empty() && self.skipped.is_empty()
    }

    pub fn add_unresolved(&mut self, entries: impl IntoIterator<Item = UnresolvedKey>) {
        self.unresolved.extend(entries);
    }

    pub fn add_malformed(&mut self, entries: impl IntoIterator<Item = MalformedRecord>) {
        self.malformed.extend(entries);
    }

    pub fn add_skipped(&mut self, entries: impl IntoIterator<Item = SkippedScenario>) {
        self.skipped.extend(entries);
    }

    pub fn merge(&mut self, other: ExclusionReport) {
        self.unresolved.extend(other.unresolved);
        self.malformed.extend(other.malformed);
        self.skipped.extend(other.skipped);
    }
}
