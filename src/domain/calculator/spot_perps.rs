//! Spot versus perpetual.
//!
//! Long: long spot (leveraged lend/borrow) hedged by a short perp, so the
//! position receives funding: `spot_leg - funding`.
//! Short: the mirror, paying funding: `spot_leg + funding`.

use rust_decimal::Decimal;
use tracing::trace;

use super::context::{CalcContext, Calculation, FundingSource};
use super::spot_leg::spot_leg;
use super::Calculator;
use crate::domain::bundle::TokenBundle;
use crate::domain::exclusion::{SkipReason, SkippedScenario};
use crate::domain::ids::Venue;
use crate::domain::leverage::Direction;
use crate::domain::opportunity::{Component, Opportunity, Scenario};
use crate::domain::rate::RateKind;

#[derive(Debug, Default)]
pub struct SpotPerpsCalculator;

impl SpotPerpsCalculator {
    pub fn new() -> Self {
        Self
    }

    fn compute_token(
        &self,
        ctx: &CalcContext<'_>,
        bundle: &TokenBundle,
        scenario: Scenario,
        direction: Direction,
        out: &mut Calculation,
    ) {
        let skip = |reason| SkippedScenario::new(bundle.token_id.clone(), scenario, reason).direction(direction);

        let funding = ctx.funding_for(&bundle.token_id);
        let mut missing = Vec::new();
        if bundle.spot.is_empty() {
            missing.extend([RateKind::Lend, RateKind::Borrow]);
        }
        if funding.is_none() {
            missing.push(RateKind::Funding);
        }
        let funding = match funding {
            Some(funding) if missing.is_empty() => funding,
            _ => {
                out.skipped.push(skip(SkipReason::MissingData { kinds: missing }));
                return;
            }
        };

        for venue in bundle.spot.keys() {
            let leg = match spot_leg(ctx, bundle, venue, direction) {
                Ok(Some(leg)) => leg,
                Ok(None) => {
                    trace!(token = %bundle.token_id, "Quote asset has no spot leg of its own");
                    continue;
                }
                Err(reason) => {
                    out.skipped.push(skip(reason).at(venue.clone()));
                    continue;
                }
            };

            for (perp_venue, &rate) in funding.rates {
                let built = Opportunity::builder(scenario, bundle.token_id.clone())
                    .direction(direction)
                    .spot_venue(venue.clone())
                    .perp_venue(perp_venue.clone())
                    .leverage(ctx.params.leverage)
                    .components(leg.iter().cloned())
                    .component(funding_component(&funding, perp_venue, rate, direction))
                    .build();
                out.push_built(built, |reason| skip(reason).at(venue.clone()));
            }
        }
    }
}

pub(super) fn funding_component(
    funding: &FundingSource<'_>,
    venue: &Venue,
    rate: Decimal,
    direction: Direction,
) -> Component {
    // The perp leg is short when spot is long and receives funding.
    let (label, weight) = match direction {
        Direction::Long => (format!("short perp {} funding", funding.token_id), -Decimal::ONE),
        Direction::Short => (format!("long perp {} funding", funding.token_id), Decimal::ONE),
    };
    let component = Component::new(
        label,
        funding.token_id.clone(),
        Some(venue.clone()),
        RateKind::Funding,
        rate,
        weight,
    );
    match funding.proxy_for {
        Some(token_id) => component.proxy_for(token_id.clone()),
        None => component,
    }
}

impl Calculator for SpotPerpsCalculator {
    fn name(&self) -> &'static str {
        "spot_perps"
    }

    fn scenarios(&self) -> &'static [Scenario] {
        &[Scenario::SpotVsPerpsLong, Scenario::SpotVsPerpsShort]
    }

    fn compute(&self, ctx: &CalcContext<'_>) -> Calculation {
        let mut out = Calculation::default();
        let sides = [
            (Scenario::SpotVsPerpsLong, Direction::Long),
            (Scenario::SpotVsPerpsShort, Direction::Short),
        ];

        for bundle in ctx.bundles.values() {
            for (scenario, direction) in sides {
                if ctx.params.is_enabled(scenario) {
                    self.compute_token(ctx, bundle, scenario, direction, &mut out);
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bundle::SpotMarket;
    use crate::domain::calculator::context::{CalcParams, ProxyPreference};
    use crate::domain::catalog::TokenCatalog;
    use crate::domain::ids::TokenId;
    use crate::domain::leverage::Leverage;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn spot_bundle(token: &str, lend: Decimal, borrow: Decimal) -> TokenBundle {
        let mut bundle = TokenBundle::new(token.into());
        bundle.spot.insert(
            Venue::lending("kamino", "main"),
            SpotMarket {
                lend: Some(lend),
                borrow: Some(borrow),
                ..SpotMarket::default()
            },
        );
        bundle
    }

    fn params(leverage: Decimal) -> CalcParams {
        CalcParams {
            leverage: Leverage::try_new(leverage).unwrap(),
            ..CalcParams::default()
        }
    }

    #[test]
    fn long_subtracts_funding() {
        let mut token = spot_bundle("Y", dec!(0.0001), dec!(0.00015));
        token.funding.insert("ExchangeA".into(), dec!(0.00005));
        let bundles = BTreeMap::from([(token.token_id.clone(), token)]);
        let catalog = TokenCatalog::default();
        let params = params(dec!(2));

        let out = SpotPerpsCalculator::new().compute(&CalcContext::new(&bundles, &catalog, &params));

        let long = out
            .opportunities
            .iter()
            .find(|o| o.scenario() == Scenario::SpotVsPerpsLong)
            .unwrap();
        assert_eq!(long.net_rate_per_hour(), dec!(-0.0001));

        let short = out
            .opportunities
            .iter()
            .find(|o| o.scenario() == Scenario::SpotVsPerpsShort)
            .unwrap();
        assert_eq!(short.net_rate_per_hour(), dec!(0));
    }

    #[test]
    fn group_base_funding_is_a_visible_proxy() {
        let catalog = TokenCatalog::parse_toml(
            r#"
[[groups]]
name = "SOL"
base = "SOL"

[[tokens]]
token_id = "SOL"
asset_group = "SOL"

[[tokens]]
token_id = "JITOSOL"
asset_group = "SOL"
"#,
        )
        .unwrap();
        let jitosol = spot_bundle("JITOSOL", dec!(0.0001), dec!(0.0002));
        let mut sol = TokenBundle::new("SOL".into());
        sol.funding.insert("Drift".into(), dec!(0.00003));
        let bundles = BTreeMap::from([(jitosol.token_id.clone(), jitosol), (sol.token_id.clone(), sol)]);
        let params = params(dec!(1));

        let out = SpotPerpsCalculator::new().compute(&CalcContext::new(&bundles, &catalog, &params));

        let jito: Vec<_> = out
            .opportunities
            .iter()
            .filter(|o| o.token_id() == &TokenId::from("JITOSOL"))
            .collect();
        assert_eq!(jito.len(), 2);
        let funding = jito[0].components().last().unwrap();
        assert_eq!(funding.token_id, TokenId::from("SOL"));
        assert_eq!(funding.proxy_for, Some(TokenId::from("JITOSOL")));
        assert!(jito[0].uses_proxy());
    }

    #[test]
    fn proxy_preference_breaks_ties() {
        let catalog = TokenCatalog::parse_toml(
            r#"
[[groups]]
name = "SOL"
base = "SOL"

[[tokens]]
token_id = "SOL"
asset_group = "SOL"

[[tokens]]
token_id = "JITOSOL"
asset_group = "SOL"
"#,
        )
        .unwrap();
        let mut jitosol = spot_bundle("JITOSOL", dec!(0.0001), dec!(0.0002));
        jitosol.funding.insert("Drift".into(), dec!(0.00001));
        let mut sol = TokenBundle::new("SOL".into());
        sol.funding.insert("Drift".into(), dec!(0.00003));
        let bundles = BTreeMap::from([(jitosol.token_id.clone(), jitosol), (sol.token_id.clone(), sol)]);

        let own = params(dec!(1));
        let out = SpotPerpsCalculator::new().compute(&CalcContext::new(&bundles, &catalog, &own));
        assert!(!out.opportunities[0].uses_proxy());

        let base = CalcParams {
            proxy: ProxyPreference::GroupBase,
            ..params(dec!(1))
        };
        let out = SpotPerpsCalculator::new().compute(&CalcContext::new(&bundles, &catalog, &base));
        assert!(out.opportunities[0].uses_proxy());
    }

    #[test]
    fn missing_funding_is_reported() {
        let token = spot_bundle("USDC", dec!(0.0001), dec!(0.0002));
        let bundles = BTreeMap::from([(token.token_id.clone(), token)]);
        let catalog = TokenCatalog::default();
        let params = params(dec!(1));

        let out = SpotPerpsCalculator::new().compute(&CalcContext::new(&bundles, &catalog, &params));

        assert!(out.opportunities.is_empty());
        assert_eq!(out.skipped.len(), 2);
        assert_eq!(
            out.skipped[0].reason,
            SkipReason::MissingData {
                kinds: vec![RateKind::Funding]
            }
        );
    }
}
