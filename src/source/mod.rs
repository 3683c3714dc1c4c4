//! Source normalizers.
//!
//! Each source publishes rates in its own shape, unit and interval. A
//! [`SourcePayload`] tags an already-decoded payload with the shape it has,
//! and [`normalize`] picks the matching normalizer by explicit `match`.
//! Every normalizer produces [`RateRecord`]s rebased to a per-hour fraction
//! and isolates failures per entry: a bad entry becomes a
//! [`MalformedRecord`] and the rest of the payload is still processed.
//!
//! # Example
//!
//! ```
//! use ratearb::domain::TokenCatalog;
//! use ratearb::source::{normalize, SourceDefaults, SourcePayload};
//! use serde_json::json;
//!
//! let catalog = TokenCatalog::parse_toml(r#"
//! [[tokens]]
//! token_id = "SOL"
//! mint = "So11111111111111111111111111111111111111112"
//! "#).unwrap();
//!
//! let payload = SourcePayload::Staking(json!([
//!     { "address": "So11111111111111111111111111111111111111112", "apy": 0.0876 }
//! ]));
//! let normalized = normalize(&payload, &catalog, &SourceDefaults::default());
//! assert_eq!(normalized.records.len(), 1);
//! ```

mod drift;
mod hyperliquid;
mod lending;
mod staking;
mod value;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{
    Binding, MalformedRecord, NativeKey, RateRecord, RateSource, TokenCatalog, UnresolvedKey,
};

/// A decoded payload, tagged with the shape it has.
#[derive(Debug, Clone, PartialEq)]
pub enum SourcePayload {
    /// Hyperliquid `predictedFundings` response.
    Hyperliquid(Value),
    /// Drift `markets24h` response.
    Drift(Value),
    /// Lending `current-rates` response.
    Lending(Value),
    /// Staking `current-staking-rates` response.
    Staking(Value),
}

impl SourcePayload {
    pub fn source(&self) -> RateSource {
        match self {
            Self::Hyperliquid(_) => RateSource::Hyperliquid,
            Self::Drift(_) => RateSource::Drift,
            Self::Lending(_) => RateSource::Lending,
            Self::Staking(_) => RateSource::Staking,
        }
    }

    pub fn value(&self) -> &Value {
        match self {
            Self::Hyperliquid(v) | Self::Drift(v) | Self::Lending(v) | Self::Staking(v) => v,
        }
    }
}

/// Native funding intervals for feeds that do not state one per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDefaults {
    /// Used when a predicted funding omits `fundingIntervalHours`.
    pub hyperliquid_interval_hours: u32,
    /// Interval the Drift `avgFunding` figure covers.
    pub drift_interval_hours: u32,
}

impl Default for SourceDefaults {
    fn default() -> Self {
        Self {
            hyperliquid_interval_hours: 1,
            drift_interval_hours: 1,
        }
    }
}

/// Output of one normalizer run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub records: Vec<RateRecord>,
    pub unresolved: Vec<UnresolvedKey>,
    pub malformed: Vec<MalformedRecord>,
}

impl Normalized {
    fn new() -> Self {
        Self::default()
    }

    /// Resolve a native key, recording it when the catalog does not know it.
    fn resolve<'c>(
        &mut self,
        catalog: &'c TokenCatalog,
        source: RateSource,
        key: &NativeKey,
    ) -> Option<&'c Binding> {
        let binding = catalog.resolve(key);
        if binding.is_none() {
            self.unresolved.push(UnresolvedKey {
                source,
                key: key.to_string(),
            });
        }
        binding
    }

    fn malformed(&mut self, source: RateSource, locator: impl Into<String>, reason: impl Into<String>) {
        let record = MalformedRecord::new(source, locator, reason);
        warn!(
            source = %record.source,
            locator = %record.locator,
            reason = %record.reason,
            "Skipping malformed record"
        );
        self.malformed.push(record);
    }

    pub fn merge(&mut self, other: Normalized) {
        self.records.extend(other.records);
        self.unresolved.extend(other.unresolved);
        self.malformed.extend(other.malformed);
    }
}

/// Normalize one payload into per-hour rate records.
pub fn normalize(payload: &SourcePayload, catalog: &TokenCatalog, defaults: &SourceDefaults) -> Normalized {
    let normalized = match payload {
        SourcePayload::Hyperliquid(value) => hyperliquid::normalize(value, catalog, defaults),
        SourcePayload::Drift(value) => drift::normalize(value, catalog, defaults),
        SourcePayload::Lending(value) => lending::normalize(value, catalog),
        SourcePayload::Staking(value) => staking::normalize(value, catalog),
    };

    debug!(
        source = %payload.source(),
        records = normalized.records.len(),
        unresolved = normalized.unresolved.len(),
        malformed = normalized.malformed.len(),
        "Source normalized"
    );
    normalized
}

/// Entries of a top-level array payload, or a malformed-payload record.
fn entries<'v>(payload: &'v Value, source: RateSource, out: &mut Normalized) -> &'v [Value] {
    match payload {
        Value::Array(items) => items,
        other => {
            out.malformed(
                source,
                "payload",
                format!("expected an array, got {}", value::kind(other)),
            );
            &[]
        }
    }
}
