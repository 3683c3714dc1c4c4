//! Staking yields.
//!
//! Shape: `[{ address, apy }]`, keyed by token mint, `apy` an annualized
//! fraction.

use serde_json::Value;

use super::value::{decimal_field, str_field};
use super::{entries, Normalized};
use crate::domain::{
    rebase_to_hourly, NativeInterval, NativeKey, RateRecord, RateSource, RateUnit, TokenCatalog,
};

const SOURCE: RateSource = RateSource::Staking;

pub(super) fn normalize(value: &Value, catalog: &TokenCatalog) -> Normalized {
    let mut out = Normalized::new();

    for (index, entry) in entries(value, SOURCE, &mut out).iter().enumerate() {
        let mint = match str_field(entry, "address") {
            Ok(mint) => mint,
            Err(reason) => {
                out.malformed(SOURCE, format!("#{index}"), reason);
                continue;
            }
        };
        let Some(binding) = out.resolve(catalog, SOURCE, &NativeKey::Mint(mint.to_string())) else {
            continue;
        };

        let per_hour = decimal_field(entry, "apy").and_then(|apy| {
            rebase_to_hourly(apy, RateUnit::Fraction, NativeInterval::Annual).map_err(|err| err.to_string())
        });
        match per_hour {
            Ok(per_hour) => out.records.push(RateRecord::stake(binding.token_id.clone(), per_hour)),
            Err(reason) => out.malformed(SOURCE, mint, reason),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TokenId;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn annual_fraction_divides_by_hours_per_year() {
        let catalog = TokenCatalog::parse_toml(
            r#"
[[tokens]]
token_id = "JITOSOL"
mint = "J1toso1uCk3RLmjorhTtrVwY9HJ7X8V9yYac6Y7kGCPn"
"#,
        )
        .unwrap();
        let payload = json!([
            { "address": "J1toso1uCk3RLmjorhTtrVwY9HJ7X8V9yYac6Y7kGCPn", "apy": 0.0876 },
            { "address": "UnknownMint111", "apy": 0.05 },
            { "address": "J1toso1uCk3RLmjorhTtrVwY9HJ7X8V9yYac6Y7kGCPn" }
        ]);

        let out = normalize(&payload, &catalog);

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].token_id, TokenId::from("JITOSOL"));
        assert_eq!(out.records[0].value_per_hour, dec!(0.00001));
        assert_eq!(out.unresolved.len(), 1);
        assert_eq!(out.malformed.len(), 1);
    }

    #[test]
    fn non_array_payload_is_one_malformed_record() {
        let out = normalize(&json!({ "error": "down" }), &TokenCatalog::default());

        assert!(out.records.is_empty());
        assert_eq!(out.malformed.len(), 1);
        assert_eq!(out.malformed[0].locator, "payload");
    }
}
