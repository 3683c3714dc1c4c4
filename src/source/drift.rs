//! Drift perpetual markets.
//!
//! Shape: `{ data: [{ symbol, marketIndex, marketType: {perp: {}} | {spot: {}}, avgFunding }] }`.
//! Only perp markets named `<STEM>-PERP` carry funding. `avgFunding` is a
//! percentage per funding interval (hourly on Drift).

use serde_json::Value;

use super::value::{decimal_field, str_field};
use super::{entries, Normalized, SourceDefaults};
use crate::domain::{
    rebase_to_hourly, NativeInterval, NativeKey, RateRecord, RateSource, RateUnit, TokenCatalog,
    UnresolvedKey, Venue,
};

const SOURCE: RateSource = RateSource::Drift;
const PROTOCOL: &str = "drift";
const VENUE: &str = "Drift";
const PERP_SUFFIX: &str = "-PERP";

pub(super) fn normalize(value: &Value, catalog: &TokenCatalog, defaults: &SourceDefaults) -> Normalized {
    let mut out = Normalized::new();
    if defaults.drift_interval_hours == 0 {
        out.malformed(SOURCE, "payload", "drift funding interval is zero");
        return out;
    }
    let interval = NativeInterval::Hours(defaults.drift_interval_hours);

    let markets = match value.get("data") {
        Some(data) => entries(data, SOURCE, &mut out),
        None => {
            out.malformed(SOURCE, "payload", "missing field data");
            return out;
        }
    };

    for (index, market) in markets.iter().enumerate() {
        let symbol = match str_field(market, "symbol") {
            Ok(symbol) => symbol,
            Err(reason) => {
                out.malformed(SOURCE, format!("#{index}"), reason);
                continue;
            }
        };
        let is_perp = market
            .get("marketType")
            .and_then(Value::as_object)
            .is_some_and(|kind| kind.contains_key("perp"));
        let Some(stem) = symbol.strip_suffix(PERP_SUFFIX).filter(|_| is_perp) else {
            continue;
        };

        let by_index = market
            .get("marketIndex")
            .and_then(Value::as_u64)
            .and_then(|index| u32::try_from(index).ok())
            .map(|index| NativeKey::perp_index(PROTOCOL, index));
        let by_symbol = NativeKey::perp(PROTOCOL, stem);
        let binding = by_index
            .as_ref()
            .and_then(|key| catalog.resolve(key))
            .or_else(|| catalog.resolve(&by_symbol));
        let Some(binding) = binding else {
            out.unresolved.push(UnresolvedKey {
                source: SOURCE,
                key: by_symbol.to_string(),
            });
            continue;
        };

        // Never read a missing figure as zero funding.
        let rate = match decimal_field(market, "avgFunding") {
            Ok(rate) => rate,
            Err(reason) => {
                out.malformed(SOURCE, symbol, reason);
                continue;
            }
        };

        let per_hour = match rebase_to_hourly(rate, RateUnit::Percent, interval) {
            Ok(per_hour) => per_hour,
            Err(err) => {
                out.malformed(SOURCE, symbol, err.to_string());
                continue;
            }
        };

        out.records.push(RateRecord::funding(
            binding.token_id.clone(),
            SOURCE,
            Venue::new(VENUE),
            per_hour,
        ));
    }

    out
}
