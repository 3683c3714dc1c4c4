//! Best spot leg per asset group.
//!
//! Members of an asset group are interchangeable collateral, so a desk
//! hedging the group's perp only cares about the cheapest way to hold any
//! of them. For each group and direction this sweeps every member, every
//! lending market and every leverage level, keeps the lowest-cost spot leg,
//! and nets it against each funding venue of the group base.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use super::context::{CalcContext, CalcParams, FundingSource};
use super::spot_leg::spot_leg;
use super::spot_perps::funding_component;
use crate::domain::catalog::AssetGroup;
use crate::domain::exclusion::{SkipReason, SkippedScenario};
use crate::domain::ids::{TokenId, Venue};
use crate::domain::leverage::{Direction, Leverage};
use crate::domain::opportunity::{Opportunity, Scenario};
use crate::domain::rate::RateKind;

/// Cheapest spot leg of a group in one direction, with its hedges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupBest {
    pub group: String,
    pub direction: Direction,
    /// Leveraged-spot opportunity of the winning member, venue and level.
    pub spot: Opportunity,
    /// `spot` netted against each funding venue of the group base.
    pub hedges: Vec<Opportunity>,
}

/// Result of one sweep over every asset group.
#[derive(Debug, Clone, Default)]
pub struct GroupSweep {
    pub entries: Vec<GroupBest>,
    pub skipped: Vec<SkippedScenario>,
}

/// Sweep every group in the catalog across `levels`.
///
/// Levels above a market's leverage cap are passed over for that market.
/// Ties keep the first candidate in (level, member, venue) order, so the
/// lowest leverage wins among equal costs.
pub fn best_per_group(ctx: &CalcContext<'_>, levels: &[Leverage]) -> GroupSweep {
    let mut sweep = GroupSweep::default();

    for group in ctx.catalog.groups() {
        for direction in [Direction::Long, Direction::Short] {
            let scenario = scenario_for(direction);
            let skip = |reason| SkippedScenario::new(group.base.clone(), scenario, reason).direction(direction);

            let Some(spot) = cheapest_leg(ctx, group, direction, levels) else {
                sweep.skipped.push(skip(SkipReason::MissingData {
                    kinds: vec![RateKind::Lend, RateKind::Borrow],
                }));
                continue;
            };
            let Some(base_funding) = ctx
                .bundle(&group.base)
                .map(|bundle| &bundle.funding)
                .filter(|funding| !funding.is_empty())
            else {
                sweep.skipped.push(skip(SkipReason::MissingData {
                    kinds: vec![RateKind::Funding],
                }));
                continue;
            };

            let hedges = hedge(&spot, group, base_funding, direction, &mut sweep.skipped);
            debug!(
                group = %group.name,
                direction = %direction,
                token = %spot.token_id(),
                hedges = hedges.len(),
                "Group best found"
            );
            sweep.entries.push(GroupBest {
                group: group.name.clone(),
                direction,
                spot,
                hedges,
            });
        }
    }

    sweep
}

fn scenario_for(direction: Direction) -> Scenario {
    match direction {
        Direction::Long => Scenario::SpotVsPerpsLong,
        Direction::Short => Scenario::SpotVsPerpsShort,
    }
}

fn cheapest_leg(
    ctx: &CalcContext<'_>,
    group: &AssetGroup,
    direction: Direction,
    levels: &[Leverage],
) -> Option<Opportunity> {
    let mut best: Option<Opportunity> = None;

    for &leverage in levels {
        let params = CalcParams {
            leverage,
            ..ctx.params.clone()
        };
        let level_ctx = CalcContext::new(ctx.bundles, ctx.catalog, &params);

        for member in ctx.catalog.members(group) {
            let Some(bundle) = ctx.bundle(member) else {
                continue;
            };
            for venue in bundle.spot.keys() {
                let Ok(Some(components)) = spot_leg(&level_ctx, bundle, venue, direction) else {
                    continue;
                };
                let built = Opportunity::builder(Scenario::LeveragedSpotFee, member.clone())
                    .direction(direction)
                    .spot_venue(venue.clone())
                    .leverage(leverage)
                    .components(components)
                    .build();
                let candidate = match built {
                    Ok(candidate) => candidate,
                    Err(err) => {
                        debug!(token = %member, venue = %venue, error = %err, "Skipping sweep candidate");
                        continue;
                    }
                };
                let better = best
                    .as_ref()
                    .map_or(true, |current| candidate.net_rate_per_hour() < current.net_rate_per_hour());
                if better {
                    best = Some(candidate);
                }
            }
        }
    }

    best
}

fn hedge(
    spot: &Opportunity,
    group: &AssetGroup,
    base_funding: &BTreeMap<Venue, Decimal>,
    direction: Direction,
    skipped: &mut Vec<SkippedScenario>,
) -> Vec<Opportunity> {
    let member: &TokenId = spot.token_id();
    let funding = FundingSource {
        token_id: &group.base,
        rates: base_funding,
        proxy_for: (member != &group.base).then_some(member),
    };
    let scenario = scenario_for(direction);

    let mut hedges = Vec::new();
    for (perp_venue, &rate) in base_funding {
        let mut builder = Opportunity::builder(scenario, member.clone())
            .direction(direction)
            .perp_venue(perp_venue.clone())
            .components(spot.components().iter().cloned())
            .component(funding_component(&funding, perp_venue, rate, direction));
        if let Some(venue) = spot.spot_venue() {
            builder = builder.spot_venue(venue.clone());
        }
        if let Some(leverage) = spot.leverage() {
            builder = builder.leverage(leverage);
        }
        match builder.build() {
            Ok(opportunity) => hedges.push(opportunity),
            Err(err) => skipped.push(SkippedScenario::from_opportunity(
                spot,
                SkipReason::InvalidResult { reason: err.to_string() },
            )),
        }
    }
    hedges
}
