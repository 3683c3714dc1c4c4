//! Perpetual versus perpetual across venues.

use rust_decimal::Decimal;

use super::context::{CalcContext, Calculation};
use super::Calculator;
use crate::domain::exclusion::{SkipReason, SkippedScenario};
use crate::domain::opportunity::{Component, Opportunity, Scenario};
use crate::domain::rate::RateKind;

/// Funding differential for every unordered pair of venues.
///
/// Venues are taken in their sorted order, so the pair `(A, B)` with
/// `A < B` yields `funding_A - funding_B` (long A, short B) and the mirror
/// is never produced. Only a token's own perps count here; asset-group
/// proxies would just repeat the base token's pairs.
#[derive(Debug, Default)]
pub struct PerpsPerpsCalculator;

impl PerpsPerpsCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl Calculator for PerpsPerpsCalculator {
    fn name(&self) -> &'static str {
        "perps_perps"
    }

    fn scenarios(&self) -> &'static [Scenario] {
        &[Scenario::PerpsVsPerps]
    }

    fn compute(&self, ctx: &CalcContext<'_>) -> Calculation {
        let scenario = Scenario::PerpsVsPerps;
        let mut out = Calculation::default();

        for bundle in ctx.bundles.values() {
            let venues: Vec<_> = bundle.funding.iter().collect();
            match venues.len() {
                0 => {
                    out.skipped.push(SkippedScenario::new(
                        bundle.token_id.clone(),
                        scenario,
                        SkipReason::MissingData {
                            kinds: vec![RateKind::Funding],
                        },
                    ));
                    continue;
                }
                1 => {
                    out.skipped.push(SkippedScenario::new(
                        bundle.token_id.clone(),
                        scenario,
                        SkipReason::InsufficientVenues { found: 1 },
                    ));
                    continue;
                }
                _ => {}
            }

            for (i, &(long_venue, &long_rate)) in venues.iter().enumerate() {
                for &(short_venue, &short_rate) in &venues[i + 1..] {
                    let built = Opportunity::builder(scenario, bundle.token_id.clone())
                        .perp_venue(long_venue.clone())
                        .perp_venue(short_venue.clone())
                        .component(Component::new(
                            format!("long perp {long_venue}"),
                            bundle.token_id.clone(),
                            Some(long_venue.clone()),
                            RateKind::Funding,
                            long_rate,
                            Decimal::ONE,
                        ))
                        .component(Component::new(
                            format!("short perp {short_venue}"),
                            bundle.token_id.clone(),
                            Some(short_venue.clone()),
                            RateKind::Funding,
                            short_rate,
                            -Decimal::ONE,
                        ))
                        .build();
                    out.push_built(built, |reason| {
                        SkippedScenario::new(bundle.token_id.clone(), scenario, reason)
                    });
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bundle::TokenBundle;
    use crate::domain::calculator::context::CalcParams;
    use crate::domain::catalog::TokenCatalog;
    use crate::domain::ids::Venue;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn compute(bundle: TokenBundle) -> Calculation {
        let bundles = BTreeMap::from([(bundle.token_id.clone(), bundle)]);
        let catalog = TokenCatalog::default();
        let params = CalcParams::default();
        PerpsPerpsCalculator::new().compute(&CalcContext::new(&bundles, &catalog, &params))
    }

    #[test]
    fn three_venues_give_three_pairs() {
        let mut token = TokenBundle::new("SOL".into());
        token.funding.insert("Binance".into(), dec!(0.00001));
        token.funding.insert("Drift".into(), dec!(-0.00002));
        token.funding.insert("Hyperliquid".into(), dec!(0.00004));

        let out = compute(token);

        assert_eq!(out.opportunities.len(), 3);
        let pairs: Vec<(String, String, Decimal)> = out
            .opportunities
            .iter()
            .map(|o| {
                (
                    o.perp_venues()[0].to_string(),
                    o.perp_venues()[1].to_string(),
                    o.net_rate_per_hour(),
                )
            })
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Binance".to_string(), "Drift".to_string(), dec!(0.00003)),
                ("Binance".to_string(), "Hyperliquid".to_string(), dec!(-0.00003)),
                ("Drift".to_string(), "Hyperliquid".to_string(), dec!(-0.00006)),
            ]
        );
    }

    #[test]
    fn single_venue_is_reported() {
        let mut token = TokenBundle::new("WIF".into());
        token.funding.insert(Venue::new("Drift"), dec!(0.0001));

        let out = compute(token);

        assert!(out.opportunities.is_empty());
        assert_eq!(out.skipped[0].reason, SkipReason::InsufficientVenues { found: 1 });
    }
}
