//! Hyperliquid predicted fundings.
//!
//! Shape: `[[coin, [[venue, {fundingRate, fundingIntervalHours?} | null], ...]], ...]`.
//! `fundingRate` is a fraction per `fundingIntervalHours`. The feed also
//! republishes the CEX venues it tracks, so one coin yields up to one
//! funding record per venue.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use super::value::{decimal_field, optional_decimal_field};
use super::{entries, Normalized, SourceDefaults};
use crate::domain::{
    rebase_to_hourly, NativeInterval, NativeKey, RateRecord, RateSource, RateUnit, TokenCatalog, Venue,
};

const SOURCE: RateSource = RateSource::Hyperliquid;
const PROTOCOL: &str = "hyperliquid";

/// Display name of a feed venue; unknown names pass through.
fn venue_name(raw: &str) -> &str {
    match raw {
        "HlPerp" => "Hyperliquid",
        "BinPerp" => "Binance",
        "BybitPerp" => "Bybit",
        "DriftPerp" => "Drift",
        other => other,
    }
}

pub(super) fn normalize(value: &Value, catalog: &TokenCatalog, defaults: &SourceDefaults) -> Normalized {
    let mut out = Normalized::new();

    for (index, entry) in entries(value, SOURCE, &mut out).iter().enumerate() {
        let Some((coin, venues)) = coin_entry(entry) else {
            out.malformed(SOURCE, format!("#{index}"), "expected [coin, [[venue, funding], ...]]");
            continue;
        };

        let key = NativeKey::perp(PROTOCOL, coin);
        let Some(binding) = out.resolve(catalog, SOURCE, &key) else {
            continue;
        };

        for venue_entry in venues {
            let Some((raw_venue, funding)) = venue_entry_parts(venue_entry) else {
                out.malformed(SOURCE, coin, "expected [venue, funding]");
                continue;
            };
            if funding.is_null() {
                continue;
            }
            let locator = format!("{coin}/{raw_venue}");

            let rate = match decimal_field(funding, "fundingRate") {
                Ok(rate) => rate,
                Err(reason) => {
                    out.malformed(SOURCE, locator, reason);
                    continue;
                }
            };
            let hours = match optional_decimal_field(funding, "fundingIntervalHours") {
                Ok(Some(hours)) => hours,
                Ok(None) => defaults.hyperliquid_interval_hours.into(),
                Err(reason) => {
                    out.malformed(SOURCE, locator, reason);
                    continue;
                }
            };
            let Some(hours) = whole_hours(hours) else {
                out.malformed(SOURCE, locator, format!("invalid funding interval {hours}"));
                continue;
            };

            let per_hour = match rebase_to_hourly(rate, RateUnit::Fraction, NativeInterval::Hours(hours)) {
                Ok(per_hour) => per_hour,
                Err(err) => {
                    out.malformed(SOURCE, locator, err.to_string());
                    continue;
                }
            };

            out.records.push(RateRecord::funding(
                binding.token_id.clone(),
                SOURCE,
                Venue::new(venue_name(raw_venue)),
                per_hour,
            ));
        }
    }

    out
}

fn coin_entry(entry: &Value) -> Option<(&str, &[Value])> {
    match entry.as_array()?.as_slice() {
        [Value::String(coin), Value::Array(venues)] => Some((coin.as_str(), venues.as_slice())),
        _ => None,
    }
}

fn venue_entry_parts(entry: &Value) -> Option<(&str, &Value)> {
    match entry.as_array()?.as_slice() {
        [Value::String(venue), funding] => Some((venue.as_str(), funding)),
        _ => None,
    }
}

/// Positive whole number of hours.
fn whole_hours(hours: Decimal) -> Option<u32> {
    if hours.fract().is_zero() {
        hours.to_u32().filter(|h| *h > 0)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TokenId;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn catalog() -> TokenCatalog {
        TokenCatalog::parse_toml(
            r#"
[[tokens]]
token_id = "SOL"
perps = [{ protocol = "hyperliquid", symbol = "SOL" }]

[[tokens]]
token_id = "BTC"
perps = [{ protocol = "hyperliquid", symbol = "BTC" }]
"#,
        )
        .unwrap()
    }

    #[test]
    fn rebases_each_venue_by_its_interval() {
        let payload = json!([
            ["SOL", [
                ["HlPerp", { "fundingRate": "0.0000125", "nextFundingTime": 1 }],
                ["BinPerp", { "fundingRate": "0.0008", "fundingIntervalHours": 8 }],
                ["BybitPerp", null]
            ]]
        ]);

        let out = normalize(&payload, &catalog(), &SourceDefaults::default());

        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].venue, Some(Venue::new("Hyperliquid")));
        assert_eq!(out.records[0].value_per_hour, dec!(0.0000125));
        assert_eq!(out.records[1].venue, Some(Venue::new("Binance")));
        assert_eq!(out.records[1].value_per_hour, dec!(0.0001));
        assert!(out.malformed.is_empty());
    }

    #[test]
    fn bad_entry_does_not_abort_the_payload() {
        let payload = json!([
            ["SOL", [["HlPerp", { "fundingRate": "oops" }]]],
            "garbage",
            ["BTC", [["HlPerp", { "fundingRate": 0.00002 }]]]
        ]);

        let out = normalize(&payload, &catalog(), &SourceDefaults::default());

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].token_id, TokenId::from("BTC"));
        assert_eq!(out.malformed.len(), 2);
        assert_eq!(out.malformed[0].locator, "SOL/HlPerp");
    }

    #[test]
    fn unknown_coins_are_reported_not_dropped_silently() {
        let payload = json!([["DOGE", [["HlPerp", { "fundingRate": "0.0001" }]]]]);

        let out = normalize(&payload, &catalog(), &SourceDefaults::default());

        assert!(out.records.is_empty());
        assert_eq!(out.unresolved.len(), 1);
        assert_eq!(out.unresolved[0].key, "hyperliquid:perp:DOGE");
    }

    #[test]
    fn zero_interval_is_malformed() {
        let payload = json!([["SOL", [["HlPerp", { "fundingRate": "0.0001", "fundingIntervalHours": 0 }]]]]);

        let out = normalize(&payload, &catalog(), &SourceDefaults::default());

        assert!(out.records.is_empty());
        assert_eq!(out.malformed.len(), 1);
    }
}
