//! Lending market rates.
//!
//! Shape: `[{ address, lendingRate?, borrowingRate? }]`, keyed by bank
//! address, with both sides as annualized percentages. A bank that only
//! reports one side yields only that record.

use serde_json::Value;

use super::value::{optional_decimal_field, str_field};
use super::{entries, Normalized};
use crate::domain::{
    rebase_to_hourly, NativeInterval, NativeKey, RateRecord, RateSource, RateUnit, TokenCatalog,
};

const SOURCE: RateSource = RateSource::Lending;

pub(super) fn normalize(value: &Value, catalog: &TokenCatalog) -> Normalized {
    let mut out = Normalized::new();

    for (index, bank) in entries(value, SOURCE, &mut out).iter().enumerate() {
        let address = match str_field(bank, "address") {
            Ok(address) => address,
            Err(reason) => {
                out.malformed(SOURCE, format!("#{index}"), reason);
                continue;
            }
        };

        let Some(binding) = out.resolve(catalog, SOURCE, &NativeKey::Bank(address.to_string())) else {
            continue;
        };
        let Some(venue) = binding.venue.clone() else {
            out.malformed(SOURCE, address, "bank binding has no lending venue");
            continue;
        };

        let sides = [
            ("lendingRate", RateRecord::lend as fn(_, _, _) -> RateRecord),
            ("borrowingRate", RateRecord::borrow),
        ];
        for (field, record) in sides {
            match optional_decimal_field(bank, field) {
                Ok(Some(annual_percent)) => {
                    match rebase_to_hourly(annual_percent, RateUnit::Percent, NativeInterval::Annual) {
                        Ok(per_hour) => out.records.push(record(binding.token_id.clone(), venue.clone(), per_hour)),
                        Err(err) => out.malformed(SOURCE, format!("{address}/{field}"), err.to_string()),
                    }
                }
                Ok(None) => {}
                Err(reason) => out.malformed(SOURCE, address, reason),
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RateKind, Venue};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn catalog() -> TokenCatalog {
        TokenCatalog::parse_toml(
            r#"
[[tokens]]
token_id = "SOL"

[[tokens.banks]]
protocol = "kamino"
market = "main"
bank = "BankSol"

[[tokens]]
token_id = "USDC"

[[tokens.banks]]
protocol = "marginfi"
market = "global"
bank = "BankUsdc"
"#,
        )
        .unwrap()
    }

    #[test]
    fn annual_percentages_become_hourly_fractions() {
        let payload = json!([
            { "address": "BankSol", "lendingRate": 8.76, "borrowingRate": "17.52" }
        ]);

        let out = normalize(&payload, &catalog());

        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0].kind, RateKind::Lend);
        assert_eq!(out.records[0].value_per_hour, dec!(0.00001));
        assert_eq!(out.records[0].venue, Some(Venue::lending("kamino", "main")));
        assert_eq!(out.records[1].kind, RateKind::Borrow);
        assert_eq!(out.records[1].value_per_hour, dec!(0.00002));
    }

    #[test]
    fn missing_side_omits_only_that_record() {
        let payload = json!([
            { "address": "BankUsdc", "lendingRate": 0 }
        ]);

        let out = normalize(&payload, &catalog());

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].kind, RateKind::Lend);
        assert_eq!(out.records[0].value_per_hour, Decimal::ZERO);
    }

    #[test]
    fn bad_side_is_isolated() {
        let payload = json!([
            { "address": "BankSol", "lendingRate": "n/a", "borrowingRate": 8.76 },
            { "lendingRate": 1.0 }
        ]);

        let out = normalize(&payload, &catalog());

        assert_eq!(out.records.len(), 1);
        assert_eq!(out.records[0].kind, RateKind::Borrow);
        assert_eq!(out.malformed.len(), 2);
    }
}
