//! Inputs shared by every calculator.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::bundle::TokenBundle;
use crate::domain::catalog::TokenCatalog;
use crate::domain::error::DomainError;
use crate::domain::exclusion::{SkipReason, SkippedScenario};
use crate::domain::ids::{TokenId, Venue};
use crate::domain::leverage::{Direction, Leverage};
use crate::domain::opportunity::{Opportunity, Scenario};

/// Which markets form the two sides of a spot leg.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotFraming {
    /// Lend and borrow the token itself.
    #[default]
    SameAsset,
    /// Pair the token with a quote asset on the same lending market.
    ///
    /// Long lends the token and borrows the quote; short lends the quote
    /// and borrows the token.
    Quote(TokenId),
}

impl SpotFraming {
    /// Directions a leveraged-spot position can take under this framing.
    pub fn directions(&self) -> &'static [Direction] {
        match self {
            Self::SameAsset => &[Direction::Long],
            Self::Quote(_) => &[Direction::Long, Direction::Short],
        }
    }
}

impl fmt::Display for SpotFraming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameAsset => f.write_str("same-asset"),
            Self::Quote(quote) => write!(f, "quote:{quote}"),
        }
    }
}

/// Whose funding to use when a token and its group base both have perps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProxyPreference {
    #[default]
    OwnMarket,
    GroupBase,
}

impl fmt::Display for ProxyPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnMarket => f.write_str("own-market"),
            Self::GroupBase => f.write_str("group-base"),
        }
    }
}

impl FromStr for ProxyPreference {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "own-market" | "own" => Ok(Self::OwnMarket),
            "group-base" | "base" => Ok(Self::GroupBase),
            _ => Err(DomainError::UnknownVariant {
                kind: "proxy preference",
                value: s.to_string(),
                expected: "own-market, group-base",
            }),
        }
    }
}

/// Caller-chosen calculation parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalcParams {
    pub leverage: Leverage,
    pub scenarios: BTreeSet<Scenario>,
    pub framing: SpotFraming,
    pub proxy: ProxyPreference,
}

impl CalcParams {
    pub fn is_enabled(&self, scenario: Scenario) -> bool {
        self.scenarios.contains(&scenario)
    }
}

impl Default for CalcParams {
    fn default() -> Self {
        Self {
            leverage: Leverage::ONE,
            scenarios: Scenario::ALL.into_iter().collect(),
            framing: SpotFraming::default(),
            proxy: ProxyPreference::default(),
        }
    }
}

/// Funding rates chosen for a token, possibly borrowed from its group base.
#[derive(Debug, Clone, Copy)]
pub struct FundingSource<'a> {
    /// Token whose perps the rates come from.
    pub token_id: &'a TokenId,
    pub rates: &'a BTreeMap<Venue, Decimal>,
    /// Set when `token_id` differs from the token being analyzed.
    pub proxy_for: Option<&'a TokenId>,
}

/// Full context for one calculation pass.
pub struct CalcContext<'a> {
    pub bundles: &'a BTreeMap<TokenId, TokenBundle>,
    pub catalog: &'a TokenCatalog,
    pub params: &'a CalcParams,
}

impl<'a> CalcContext<'a> {
    pub fn new(
        bundles: &'a BTreeMap<TokenId, TokenBundle>,
        catalog: &'a TokenCatalog,
        params: &'a CalcParams,
    ) -> Self {
        Self {
            bundles,
            catalog,
            params,
        }
    }

    pub fn bundle(&self, token_id: &TokenId) -> Option<&'a TokenBundle> {
        self.bundles.get(token_id)
    }

    /// Funding rates for a token, applying asset-group substitution.
    pub fn funding_for(&self, token_id: &'a TokenId) -> Option<FundingSource<'a>> {
        let own = self
            .bundle(token_id)
            .filter(|bundle| !bundle.funding.is_empty())
            .map(|bundle| FundingSource {
                token_id,
                rates: &bundle.funding,
                proxy_for: None,
            });

        let base = self.catalog.group_base(token_id).and_then(|base| {
            self.bundle(base)
                .filter(|bundle| !bundle.funding.is_empty())
                .map(|bundle| FundingSource {
                    token_id: &bundle.token_id,
                    rates: &bundle.funding,
                    proxy_for: Some(token_id),
                })
        });

        match self.params.proxy {
            ProxyPreference::OwnMarket => own.or(base),
            ProxyPreference::GroupBase => base.or(own),
        }
    }
}

/// Output of one calculator.
#[derive(Debug, Clone, Default)]
pub struct Calculation {
    pub opportunities: Vec<Opportunity>,
    pub skipped: Vec<SkippedScenario>,
}

impl Calculation {
    /// Keep a built opportunity, or record why it could not be built.
    pub fn push_built(
        &mut self,
        built: Result<Opportunity, DomainError>,
        skip: impl FnOnce(SkipReason) -> SkippedScenario,
    ) {
        match built {
            Ok(opportunity) => self.opportunities.push(opportunity),
            Err(err) => {
                let skipped = skip(SkipReason::InvalidResult { reason: err.to_string() });
                warn!(
                    token = %skipped.token_id,
                    scenario = %skipped.scenario,
                    error = %err,
                    "Opportunity could not be built"
                );
                self.skipped.push(skipped);
            }
        }
    }

    pub fn merge(&mut self, other: Calculation) {
        self.opportunities.extend(other.opportunities);
        self.skipped.extend(other.skipped);
    }
}
