//! Opportunity type with builder pattern.
//!
//! An [`Opportunity`] is one computed scenario for one token. Its net rate
//! is never stored independently: it is the sum of its [`Component`]s, each
//! a rate multiplied by a signed weight, so the breakdown shown to a user
//! always adds up to the headline number.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::ids::{TokenId, Venue};
use super::leverage::{Direction, Leverage};
use super::rate::RateKind;

/// Scenario families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Net cost of a leveraged spot position financed by borrowing.
    LeveragedSpotFee,
    /// Long spot, short perpetual.
    SpotVsPerpsLong,
    /// Short spot, long perpetual.
    SpotVsPerpsShort,
    /// Long one venue's perpetual, short another's.
    PerpsVsPerps,
}

impl Scenario {
    pub const ALL: [Scenario; 4] = [
        Self::LeveragedSpotFee,
        Self::SpotVsPerpsLong,
        Self::SpotVsPerpsShort,
        Self::PerpsVsPerps,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeveragedSpotFee => "leveraged-spot-fee",
            Self::SpotVsPerpsLong => "spot-vs-perps-long",
            Self::SpotVsPerpsShort => "spot-vs-perps-short",
            Self::PerpsVsPerps => "perps-vs-perps",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scenario {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|scenario| scenario.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::UnknownVariant {
                kind: "scenario",
                value: s.to_string(),
                expected: "leveraged-spot-fee, spot-vs-perps-long, spot-vs-perps-short, perps-vs-perps",
            })
    }
}

/// One summand of an opportunity's net rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub label: String,
    /// Token whose rate this is.
    pub token_id: TokenId,
    pub venue: Option<Venue>,
    pub kind: RateKind,
    pub rate_per_hour: Decimal,
    /// Signed multiplier applied to the rate.
    pub weight: Decimal,
    /// Set when this rate stands in for a token without its own market.
    pub proxy_for: Option<TokenId>,
}

impl Component {
    pub fn new(
        label: impl Into<String>,
        token_id: TokenId,
        venue: Option<Venue>,
        kind: RateKind,
        rate_per_hour: Decimal,
        weight: Decimal,
    ) -> Self {
        Self {
            label: label.into(),
            token_id,
            venue,
            kind,
            rate_per_hour,
            weight,
            proxy_for: None,
        }
    }

    /// Mark this component as a proxy for another token's missing market.
    #[must_use]
    pub fn proxy_for(mut self, token_id: TokenId) -> Self {
        self.proxy_for = Some(token_id);
        self
    }

    /// Contribution to the net rate, `None` on overflow.
    pub fn contribution(&self) -> Option<Decimal> {
        self.rate_per_hour.checked_mul(self.weight)
    }

    pub fn is_proxy(&self) -> bool {
        self.proxy_for.is_some()
    }
}

/// A computed arbitrage scenario for one token.
///
/// Positive net rate is a cost to the holder, negative is a yield.
/// Use `Opportunity::builder()` to construct instances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Opportunity {
    scenario: Scenario,
    token_id: TokenId,
    direction: Option<Direction>,
    spot_venue: Option<Venue>,
    perp_venues: Vec<Venue>,
    leverage: Option<Leverage>,
    net_rate_per_hour: Decimal,
    components: Vec<Component>,
}

impl Opportunity {
    pub fn builder(scenario: Scenario, token_id: TokenId) -> OpportunityBuilder {
        OpportunityBuilder::new(scenario, token_id)
    }

    pub fn scenario(&self) -> Scenario {
        self.scenario
    }

    pub fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn spot_venue(&self) -> Option<&Venue> {
        self.spot_venue.as_ref()
    }

    /// One venue for spot-vs-perps, the (long, short) pair for perps-vs-perps.
    pub fn perp_venues(&self) -> &[Venue] {
        &self.perp_venues
    }

    pub fn leverage(&self) -> Option<Leverage> {
        self.leverage
    }

    pub fn net_rate_per_hour(&self) -> Decimal {
        self.net_rate_per_hour
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Whether any component is an asset-group proxy.
    pub fn uses_proxy(&self) -> bool {
        self.components.iter().any(Component::is_proxy)
    }

    /// Human-readable venue description, e.g. `kamino(main) / Drift`.
    pub fn venue_label(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(spot) = &self.spot_venue {
            parts.push(spot.as_str());
        }
        parts.extend(self.perp_venues.iter().map(Venue::as_str));
        parts.join(" / ")
    }
}

/// Builder for constructing `Opportunity` instances.
///
/// The net rate is derived from the components on `build()`.
///
/// # Example
///
/// ```
/// use ratearb::domain::{Component, Opportunity, RateKind, Scenario};
/// use rust_decimal_macros::dec;
///
/// let opportunity = Opportunity::builder(Scenario::PerpsVsPerps, "SOL".into())
///     .perp_venue("Drift".into())
///     .perp_venue("Hyperliquid".into())
///     .component(Component::new("long Drift", "SOL".into(), Some("Drift".into()), RateKind::Funding, dec!(0.00002), dec!(1)))
///     .component(Component::new("short Hyperliquid", "SOL".into(), Some("Hyperliquid".into()), RateKind::Funding, dec!(0.00005), dec!(-1)))
///     .build()
///     .unwrap();
///
/// assert_eq!(opportunity.net_rate_per_hour(), dec!(-0.00003));
/// ```
#[derive(Debug)]
pub struct OpportunityBuilder {
    scenario: Scenario,
    token_id: TokenId,
    direction: Option<Direction>,
    spot_venue: Option<Venue>,
    perp_venues: Vec<Venue>,
    leverage: Option<Leverage>,
    components: Vec<Component>,
}

impl OpportunityBuilder {
    pub fn new(scenario: Scenario, token_id: TokenId) -> Self {
        Self {
            scenario,
            token_id,
            direction: None,
            spot_venue: None,
            perp_venues: Vec::new(),
            leverage: None,
            components: Vec::new(),
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn spot_venue(mut self, venue: Venue) -> Self {
        self.spot_venue = Some(venue);
        self
    }

    pub fn perp_venue(mut self, venue: Venue) -> Self {
        self.perp_venues.push(venue);
        self
    }

    pub fn leverage(mut self, leverage: Leverage) -> Self {
        self.leverage = Some(leverage);
        self
    }

    pub fn component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    pub fn components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        self.components.extend(components);
        self
    }

    /// Build the opportunity, summing the components into the net rate.
    ///
    /// # Errors
    /// Returns [`DomainError::NoComponents`] when no component was added and
    /// [`DomainError::Overflow`] when the sum leaves the Decimal range.
    pub fn build(self) -> Result<Opportunity, DomainError> {
        if self.components.is_empty() {
            return Err(DomainError::NoComponents);
        }
        let net_rate_per_hour = self
            .components
            .iter()
            .try_fold(Decimal::ZERO, |net, component| {
                component.contribution().and_then(|c| net.checked_add(c))
            })
            .ok_or(DomainError::Overflow {
                operation: "net rate",
            })?;

        Ok(Opportunity {
            scenario: self.scenario,
            token_id: self.token_id,
            direction: self.direction,
            spot_venue: self.spot_venue,
            perp_venues: self.perp_venues,
            leverage: self.leverage,
            net_rate_per_hour,
            components: self.components,
        })
    }
}
