//! Table rendering for bundles, opportunities and exclusions.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use tabled::{Table, Tabled};

use crate::domain::{ExclusionReport, Interval, RankedOpportunity, TokenBundle, TokenCatalog, TokenId, Venue};
use crate::engine::GroupEntry;

const ABSENT: &str = "-";

/// Render a rate as a percentage with fixed precision.
pub fn percent(value: Decimal) -> String {
    format!("{:.4}%", value.saturating_mul(Decimal::ONE_HUNDRED))
}

fn scaled(value: Option<Decimal>, interval: Interval) -> String {
    value.map_or_else(|| ABSENT.to_string(), |v| percent(v.saturating_mul(interval.hours())))
}

fn or_absent<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| ABSENT.to_string(), |v| v.to_string())
}

#[derive(Tabled)]
struct RateRow {
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Venue")]
    venue: String,
    #[tabled(rename = "Lend")]
    lend: String,
    #[tabled(rename = "Borrow")]
    borrow: String,
    #[tabled(rename = "Funding")]
    funding: String,
    #[tabled(rename = "Stake")]
    stake: String,
}

/// One row per (token, venue), rates scaled to `interval`.
///
/// Absent sides render as `-`; a reported zero renders as `0.0000%`.
pub fn rates_table(bundles: &BTreeMap<TokenId, TokenBundle>, interval: Interval) -> String {
    let mut rows = Vec::new();
    for bundle in bundles.values() {
        let venues: BTreeSet<&Venue> = bundle.spot.keys().chain(bundle.funding.keys()).collect();
        let group = or_absent(bundle.asset_group.as_deref());
        let stake = scaled(bundle.stake, interval);

        if venues.is_empty() {
            rows.push(RateRow {
                token: bundle.token_id.to_string(),
                group: group.clone(),
                venue: ABSENT.to_string(),
                lend: ABSENT.to_string(),
                borrow: ABSENT.to_string(),
                funding: ABSENT.to_string(),
                stake: stake.clone(),
            });
        }
        for venue in venues {
            rows.push(RateRow {
                token: bundle.token_id.to_string(),
                group: group.clone(),
                venue: venue.to_string(),
                lend: scaled(bundle.lend_at(venue), interval),
                borrow: scaled(bundle.borrow_at(venue), interval),
                funding: scaled(bundle.funding_at(venue), interval),
                stake: stake.clone(),
            });
        }
    }
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct OpportunityRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Scenario")]
    scenario: String,
    #[tabled(rename = "Dir")]
    direction: String,
    #[tabled(rename = "Venues")]
    venues: String,
    #[tabled(rename = "Lev")]
    leverage: String,
    #[tabled(rename = "Net")]
    net: String,
    #[tabled(rename = "APY")]
    apy: String,
}

/// Ranked opportunities; tokens priced through a group proxy are starred.
pub fn opportunities_table(ranked: &[RankedOpportunity]) -> String {
    let rows = ranked.iter().enumerate().map(|(index, entry)| {
        let opportunity = &entry.opportunity;
        let marker = if opportunity.uses_proxy() { "*" } else { "" };
        OpportunityRow {
            rank: index + 1,
            token: format!("{}{marker}", opportunity.token_id()),
            scenario: opportunity.scenario().to_string(),
            direction: or_absent(opportunity.direction()),
            venues: opportunity.venue_label(),
            leverage: or_absent(opportunity.leverage()),
            net: format!("{:.4}%", entry.percent()),
            apy: format!("{:.2}%", entry.apy_percent()),
        }
    });
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Dir")]
    direction: String,
    #[tabled(rename = "Spot leg")]
    spot_leg: String,
    #[tabled(rename = "Spot")]
    spot: String,
    #[tabled(rename = "Perp")]
    perp: String,
    #[tabled(rename = "Net")]
    net: String,
}

/// One row per hedge of each group's best spot leg.
///
/// A group whose base has no perps still gets its spot row.
pub fn groups_table(entries: &[GroupEntry]) -> String {
    let mut rows = Vec::new();
    for entry in entries {
        let spot = &entry.spot.opportunity;
        let spot_leg = format!(
            "{} @ {} {}",
            spot.token_id(),
            or_absent(spot.spot_venue()),
            or_absent(spot.leverage())
        );
        let row = |perp: String, net: String| GroupRow {
            group: entry.group.clone(),
            direction: entry.direction.to_string(),
            spot_leg: spot_leg.clone(),
            spot: format!("{:.4}%", entry.spot.percent()),
            perp,
            net,
        };

        if entry.hedges.is_empty() {
            rows.push(row(ABSENT.to_string(), ABSENT.to_string()));
        }
        for hedge in &entry.hedges {
            let marker = if hedge.opportunity.uses_proxy() { "*" } else { "" };
            let perp = or_absent(hedge.opportunity.perp_venues().first());
            rows.push(row(format!("{perp}{marker}"), format!("{:.4}%", hedge.percent())));
        }
    }
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Leg")]
    label: String,
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Venue")]
    venue: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Weight")]
    weight: String,
    #[tabled(rename = "Contribution")]
    contribution: String,
}

/// Components of one opportunity, scaled to its display interval.
pub fn breakdown_table(entry: &RankedOpportunity) -> String {
    let hours = entry.interval.hours();
    let rows = entry.opportunity.components().iter().map(|component| {
        let token = match &component.proxy_for {
            Some(proxied) => format!("{} (for {proxied})", component.token_id),
            None => component.token_id.to_string(),
        };
        ComponentRow {
            label: component.label.clone(),
            token,
            venue: or_absent(component.venue.as_ref()),
            rate: percent(component.rate_per_hour.saturating_mul(hours)),
            weight: component.weight.normalize().to_string(),
            contribution: or_absent(component.contribution().map(|c| percent(c.saturating_mul(hours)))),
        }
    });
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct CatalogRow {
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Perps")]
    perps: String,
    #[tabled(rename = "Banks")]
    banks: String,
    #[tabled(rename = "Mint")]
    mint: String,
}

/// Catalog identities with their perp and bank bindings.
pub fn catalog_table(catalog: &TokenCatalog) -> String {
    let rows = catalog.identities().map(|identity| {
        let perps: Vec<String> = identity
            .perps
            .iter()
            .map(|perp| match (&perp.symbol, perp.market_index) {
                (_, Some(index)) => format!("{}#{index}", perp.protocol),
                (Some(symbol), None) => format!("{}:{symbol}", perp.protocol),
                (None, None) => format!("{}:{}", perp.protocol, identity.display_symbol()),
            })
            .collect();
        let banks: Vec<String> = identity.banks.iter().map(|bank| bank.venue().to_string()).collect();
        let group = match identity.asset_group.as_deref() {
            Some(name) if catalog.group(name).is_some_and(|group| group.base == identity.token_id) => {
                format!("{name} (base)")
            }
            Some(name) => name.to_string(),
            None => ABSENT.to_string(),
        };

        CatalogRow {
            token: identity.token_id.to_string(),
            group,
            perps: if perps.is_empty() { ABSENT.to_string() } else { perps.join(", ") },
            banks: if banks.is_empty() { ABSENT.to_string() } else { banks.join(", ") },
            mint: or_absent(identity.mint.as_deref()),
        }
    });
    Table::new(rows).to_string()
}

#[derive(Tabled)]
struct UnresolvedRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Key")]
    key: String,
}

#[derive(Tabled)]
struct MalformedRow {
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Record")]
    locator: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

#[derive(Tabled)]
struct SkippedRow {
    #[tabled(rename = "Token")]
    token: String,
    #[tabled(rename = "Scenario")]
    scenario: String,
    #[tabled(rename = "Venue")]
    venue: String,
    #[tabled(rename = "Dir")]
    direction: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// The three exclusion tables, each `None` when it has no entries.
pub struct ExclusionTables {
    pub unresolved: Option<String>,
    pub malformed: Option<String>,
    pub skipped: Option<String>,
}

pub fn exclusion_tables(report: &ExclusionReport) -> ExclusionTables {
    let unresolved = (!report.unresolved().is_empty()).then(|| {
        Table::new(report.unresolved().iter().map(|entry| UnresolvedRow {
            source: entry.source.to_string(),
            key: entry.key.clone(),
        }))
        .to_string()
    });
    let malformed = (!report.malformed().is_empty()).then(|| {
        Table::new(report.malformed().iter().map(|entry| MalformedRow {
            source: entry.source.to_string(),
            locator: entry.locator.clone(),
            reason: entry.reason.clone(),
        }))
        .to_string()
    });
    let skipped = (!report.skipped().is_empty()).then(|| {
        Table::new(report.skipped().iter().map(|entry| SkippedRow {
            token: entry.token_id.to_string(),
            scenario: entry.scenario.to_string(),
            venue: or_absent(entry.venue.as_ref()),
            direction: or_absent(entry.direction),
            reason: entry.reason.to_string(),
        }))
        .to_string()
    });

    ExclusionTables {
        unresolved,
        malformed,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SpotMarket, TokenBundle};
    use rust_decimal_macros::dec;

    #[test]
    fn percent_uses_four_places() {
        assert_eq!(percent(dec!(-0.0024)), "-0.2400%");
        assert_eq!(percent(Decimal::ZERO), "0.0000%");
    }

    #[test]
    fn rates_table_distinguishes_absent_from_zero() {
        let mut bundle = TokenBundle::new(TokenId::new("SOL"));
        bundle.spot.insert(
            Venue::new("kamino(main)"),
            SpotMarket {
                lend: Some(Decimal::ZERO),
                borrow: None,
                ..SpotMarket::default()
            },
        );
        let bundles = BTreeMap::from([(bundle.token_id.clone(), bundle)]);

        let table = rates_table(&bundles, Interval::OneHour);
        let row = table
            .lines()
            .find(|line| line.contains("kamino(main)"))
            .unwrap();
        assert!(row.contains("0.0000%"));
        assert!(row.contains(" - "));
    }

    #[test]
    fn stake_only_token_gets_a_row() {
        let mut bundle = TokenBundle::new(TokenId::new("JITOSOL"));
        bundle.stake = Some(dec!(0.00001));
        let bundles = BTreeMap::from([(bundle.token_id.clone(), bundle)]);

        let table = rates_table(&bundles, Interval::OneDay);
        assert!(table.contains("JITOSOL"));
        assert!(table.contains("0.0240%"));
    }
}
