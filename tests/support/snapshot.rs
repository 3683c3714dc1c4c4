use std::fs;

use ratearb::engine::Snapshot;
use ratearb::source::SourcePayload;
use serde_json::{json, Value};

use super::catalog::fixture;

fn read(file: &str) -> Value {
    let content = fs::read_to_string(fixture(&format!("snapshot/{file}"))).expect("fixture file");
    serde_json::from_str(&content).expect("fixture json")
}

/// Every payload of `tests/fixtures/snapshot`.
pub fn fixture_payloads() -> Vec<SourcePayload> {
    vec![
        SourcePayload::Hyperliquid(read("hyperliquid.json")),
        SourcePayload::Drift(read("drift.json")),
        SourcePayload::Lending(read("rates.json")),
        SourcePayload::Staking(read("staking.json")),
    ]
}

pub fn fixture_snapshot() -> Snapshot {
    Snapshot::new(fixture_payloads())
}

/// Hyperliquid payload with one hourly funding per (coin, venue).
pub fn hyperliquid(entries: &[(&str, &[(&str, &str)])]) -> SourcePayload {
    let coins: Vec<Value> = entries
        .iter()
        .map(|(coin, venues)| {
            let venues: Vec<Value> = venues
                .iter()
                .map(|(venue, rate)| json!([venue, { "fundingRate": rate, "fundingIntervalHours": 1 }]))
                .collect();
            json!([coin, venues])
        })
        .collect();
    SourcePayload::Hyperliquid(Value::Array(coins))
}

/// Lending payload of `(bank, lending %, borrowing %)`, sides optional.
pub fn lending(banks: &[(&str, Option<&str>, Option<&str>)]) -> SourcePayload {
    let entries: Vec<Value> = banks
        .iter()
        .map(|(address, lend, borrow)| {
            let mut entry = json!({ "address": address });
            if let Some(lend) = lend {
                entry["lendingRate"] = json!(lend);
            }
            if let Some(borrow) = borrow {
                entry["borrowingRate"] = json!(borrow);
            }
            entry
        })
        .collect();
    SourcePayload::Lending(Value::Array(entries))
}
