//! Cross-source join of rate records into per-token bundles.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use super::catalog::TokenCatalog;
use super::ids::{TokenId, Venue};
use super::leverage::LeverageCaps;
use super::rate::{RateKind, RateRecord};

/// Lend and borrow sides of one lending market.
///
/// `None` means no source reported that side; `Some(0)` is a reported zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpotMarket {
    pub lend: Option<Decimal>,
    pub borrow: Option<Decimal>,
    pub max_leverage: LeverageCaps,
}

/// Everything currently known about one token, all rates per hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenBundle {
    pub token_id: TokenId,
    pub asset_group: Option<String>,
    pub stake: Option<Decimal>,
    pub spot: BTreeMap<Venue, SpotMarket>,
    pub funding: BTreeMap<Venue, Decimal>,
}

impl TokenBundle {
    pub fn new(token_id: TokenId) -> Self {
        Self {
            token_id,
            asset_group: None,
            stake: None,
            spot: BTreeMap::new(),
            funding: BTreeMap::new(),
        }
    }

    /// Lend rate of the first lending market, for single-market tokens.
    pub fn lend(&self) -> Option<Decimal> {
        self.spot.values().find_map(|market| market.lend)
    }

    /// Borrow rate of the first lending market, for single-market tokens.
    pub fn borrow(&self) -> Option<Decimal> {
        self.spot.values().find_map(|market| market.borrow)
    }

    pub fn lend_at(&self, venue: &Venue) -> Option<Decimal> {
        self.spot.get(venue).and_then(|market| market.lend)
    }

    pub fn borrow_at(&self, venue: &Venue) -> Option<Decimal> {
        self.spot.get(venue).and_then(|market| market.borrow)
    }

    pub fn funding_at(&self, venue: &Venue) -> Option<Decimal> {
        self.funding.get(venue).copied()
    }

    fn absorb(&mut self, record: &RateRecord) {
        let value = record.value_per_hour;
        match record.kind {
            RateKind::Stake => keep_max(&mut self.stake, value, record),
            RateKind::Funding => {
                let Some(venue) = record.venue.clone() else {
                    warn!(token = %record.token_id, "Funding record without venue dropped");
                    return;
                };
                match self.funding.entry(venue) {
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                    Entry::Occupied(mut slot) => {
                        warn_duplicate(record);
                        let current = slot.get_mut();
                        *current = (*current).max(value);
                    }
                }
            }
            RateKind::Lend | RateKind::Borrow => {
                let Some(venue) = record.venue.clone() else {
                    warn!(token = %record.token_id, kind = %record.kind, "Spot record without venue dropped");
                    return;
                };
                let market = self.spot.entry(venue).or_default();
                let side = if record.kind == RateKind::Lend {
                    &mut market.lend
                } else {
                    &mut market.borrow
                };
                keep_max(side, value, record);
            }
        }
    }
}

fn keep_max(slot: &mut Option<Decimal>, value: Decimal, record: &RateRecord) {
    match slot {
        Some(current) => {
            warn_duplicate(record);
            *current = (*current).max(value);
        }
        None => *slot = Some(value),
    }
}

fn warn_duplicate(record: &RateRecord) {
    warn!(
        token = %record.token_id,
        kind = %record.kind,
        source = %record.source,
        "Duplicate rate observation, keeping the larger value"
    );
}

/// Join rate records into one bundle per token.
///
/// The result depends only on the set of records, not their order:
/// duplicates of the same (token, kind, venue) collapse to the larger value.
/// Leverage caps and asset groups are taken from the catalog.
pub fn join(records: &[RateRecord], catalog: &TokenCatalog) -> BTreeMap<TokenId, TokenBundle> {
    let mut bundles: BTreeMap<TokenId, TokenBundle> = BTreeMap::new();

    for record in records {
        bundles
            .entry(record.token_id.clone())
            .or_insert_with(|| TokenBundle::new(record.token_id.clone()))
            .absorb(record);
    }

    for bundle in bundles.values_mut() {
        let Some(identity) = catalog.identity(&bundle.token_id) else {
            continue;
        };
        bundle.asset_group = identity.asset_group.clone();
        for (venue, market) in &mut bundle.spot {
            if let Some(bank) = identity.bank_at(venue) {
                market.max_leverage = bank.max_leverage;
            }
        }
    }

    bundles
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::rate::RateSource;
    use rust_decimal_macros::dec;

    fn records() -> Vec<RateRecord> {
        let kamino = Venue::lending("kamino", "main");
        vec![
            RateRecord::funding("SOL".into(), RateSource::Hyperliquid, "Hyperliquid".into(), dec!(0.00001)),
            RateRecord::funding("SOL".into(), RateSource::Drift, "Drift".into(), dec!(-0.00002)),
            RateRecord::lend("SOL".into(), kamino.clone(), dec!(0.000005)),
            RateRecord::borrow("SOL".into(), kamino.clone(), dec!(0.00001)),
            RateRecord::stake("JITOSOL".into(), dec!(0.0000085)),
            RateRecord::lend("USDC".into(), kamino, dec!(0)),
        ]
    }

    #[test]
    fn joins_records_by_token() {
        let bundles = join(&records(), &TokenCatalog::default());

        assert_eq!(bundles.len(), 3);
        let sol = &bundles[&TokenId::from("SOL")];
        assert_eq!(sol.funding.len(), 2);
        assert_eq!(sol.lend(), Some(dec!(0.000005)));
        assert_eq!(sol.borrow(), Some(dec!(0.00001)));
        assert_eq!(sol.stake, None);
    }

    #[test]
    fn absent_and_zero_are_distinct() {
        let bundles = join(&records(), &TokenCatalog::default());

        let usdc = &bundles[&TokenId::from("USDC")];
        assert_eq!(usdc.lend(), Some(Decimal::ZERO));
        assert_eq!(usdc.borrow(), None);

        let jitosol = &bundles[&TokenId::from("JITOSOL")];
        assert_eq!(jitosol.lend(), None);
        assert_eq!(jitosol.stake, Some(dec!(0.0000085)));
    }

    #[test]
    fn join_is_order_independent() {
        let mut input = records();
        input.push(RateRecord::funding(
            "SOL".into(),
            RateSource::Hyperliquid,
            "Hyperliquid".into(),
            dec!(0.00003),
        ));
        let forward = join(&input, &TokenCatalog::default());

        input.reverse();
        let reversed = join(&input, &TokenCatalog::default());

        input.rotate_left(3);
        let rotated = join(&input, &TokenCatalog::default());

        assert_eq!(forward, reversed);
        assert_eq!(forward, rotated);
        assert_eq!(
            forward[&TokenId::from("SOL")].funding_at(&"Hyperliquid".into()),
            Some(dec!(0.00003))
        );
    }

    #[test]
    fn copies_bank_caps_and_group_from_catalog() {
        let catalog = TokenCatalog::parse_toml(
            r#"
[[groups]]
name = "SOL"
base = "SOL"

[[tokens]]
token_id = "SOL"
asset_group = "SOL"
banks = [{ protocol = "kamino", market = "main", bank = "b1", max_leverage = { long = 4 } }]
"#,
        )
        .unwrap();

        let bundles = join(&records(), &catalog);
        let sol = &bundles[&TokenId::from("SOL")];
        assert_eq!(sol.asset_group.as_deref(), Some("SOL"));
        assert_eq!(
            sol.spot[&Venue::lending("kamino", "main")].max_leverage.long,
            Some(dec!(4))
        );
    }
}
