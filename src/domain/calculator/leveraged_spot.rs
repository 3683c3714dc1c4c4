//! Leveraged-spot fee rate.

use tracing::trace;

use super::context::{CalcContext, Calculation};
use super::spot_leg::spot_leg;
use super::Calculator;
use crate::domain::exclusion::{SkipReason, SkippedScenario};
use crate::domain::opportunity::{Opportunity, Scenario};
use crate::domain::rate::RateKind;

/// Net holding cost of a leveraged spot position on each lending market.
#[derive(Debug, Default)]
pub struct LeveragedSpotCalculator;

impl LeveragedSpotCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl Calculator for LeveragedSpotCalculator {
    fn name(&self) -> &'static str {
        "leveraged_spot"
    }

    fn scenarios(&self) -> &'static [Scenario] {
        &[Scenario::LeveragedSpotFee]
    }

    fn compute(&self, ctx: &CalcContext<'_>) -> Calculation {
        let scenario = Scenario::LeveragedSpotFee;
        let leverage = ctx.params.leverage;
        let mut out = Calculation::default();

        for bundle in ctx.bundles.values() {
            if bundle.spot.is_empty() {
                out.skipped.push(SkippedScenario::new(
                    bundle.token_id.clone(),
                    scenario,
                    SkipReason::MissingData {
                        kinds: vec![RateKind::Lend, RateKind::Borrow],
                    },
                ));
                continue;
            }

            for &direction in ctx.params.framing.directions() {
                for venue in bundle.spot.keys() {
                    match spot_leg(ctx, bundle, venue, direction) {
                        Ok(Some(components)) => {
                            let built = Opportunity::builder(scenario, bundle.token_id.clone())
                                .direction(direction)
                                .spot_venue(venue.clone())
                                .leverage(leverage)
                                .components(components)
                                .build();
                            out.push_built(built, |reason| {
                                SkippedScenario::new(bundle.token_id.clone(), scenario, reason)
                                    .at(venue.clone())
                                    .direction(direction)
                            });
                        }
                        Ok(None) => {
                            trace!(token = %bundle.token_id, "Quote asset has no spot leg of its own");
                        }
                        Err(reason) => out.skipped.push(
                            SkippedScenario::new(bundle.token_id.clone(), scenario, reason)
                                .at(venue.clone())
                                .direction(direction),
                        ),
                    }
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bundle::{SpotMarket, TokenBundle};
    use crate::domain::calculator::context::CalcParams;
    use crate::domain::catalog::TokenCatalog;
    use crate::domain::ids::{TokenId, Venue};
    use crate::domain::leverage::Leverage;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    #[test]
    fn token_without_lend_rate_is_skipped_and_reported() {
        let mut token = TokenBundle::new("X".into());
        token.spot.insert(
            Venue::lending("kamino", "main"),
            SpotMarket {
                borrow: Some(dec!(0.0002)),
                ..SpotMarket::default()
            },
        );
        let bundles = BTreeMap::from([(token.token_id.clone(), token)]);
        let catalog = TokenCatalog::default();
        let params = CalcParams::default();

        let out = LeveragedSpotCalculator::new().compute(&CalcContext::new(&bundles, &catalog, &params));

        assert!(out.opportunities.is_empty());
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].token_id, TokenId::from("X"));
        assert_eq!(
            out.skipped[0].reason,
            SkipReason::MissingData {
                kinds: vec![RateKind::Lend]
            }
        );
    }

    #[test]
    fn one_opportunity_per_lending_market() {
        let mut token = TokenBundle::new("SOL".into());
        for (market, lend) in [("main", dec!(0.0001)), ("jlp", dec!(0.0002))] {
            token.spot.insert(
                Venue::lending("kamino", market),
                SpotMarket {
                    lend: Some(lend),
                    borrow: Some(dec!(0.0003)),
                    ..SpotMarket::default()
                },
            );
        }
        let bundles = BTreeMap::from([(token.token_id.clone(), token)]);
        let catalog = TokenCatalog::default();
        let params = CalcParams {
            leverage: Leverage::try_new(dec!(2)).unwrap(),
            ..CalcParams::default()
        };

        let out = LeveragedSpotCalculator::new().compute(&CalcContext::new(&bundles, &catalog, &params));

        assert_eq!(out.opportunities.len(), 2);
        let jlp = &out.opportunities[0];
        assert_eq!(jlp.spot_venue(), Some(&Venue::lending("kamino", "jlp")));
        assert_eq!(jlp.net_rate_per_hour(), dec!(-0.0001));
    }

    #[test]
    fn overflowing_leg_is_reported_not_dropped() {
        let mut token = TokenBundle::new("SOL".into());
        token.spot.insert(
            Venue::lending("kamino", "main"),
            SpotMarket {
                lend: Some(dec!(10)),
                borrow: Some(dec!(10)),
                ..SpotMarket::default()
            },
        );
        let bundles = BTreeMap::from([(token.token_id.clone(), token)]);
        let catalog = TokenCatalog::default();
        let params = CalcParams {
            leverage: Leverage::try_new(Decimal::MAX / dec!(2)).unwrap(),
            ..CalcParams::default()
        };

        let out = LeveragedSpotCalculator::new().compute(&CalcContext::new(&bundles, &catalog, &params));

        assert!(out.opportunities.is_empty());
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].venue, Some(Venue::lending("kamino", "main")));
        assert!(matches!(out.skipped[0].reason, SkipReason::InvalidResult { .. }));
    }
}
