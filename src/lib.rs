//! Ratearb - funding, lending and staking rate arbitrage calculator.
//!
//! This crate normalizes rates from heterogeneous feeds into a single per-hour
//! representation, joins them per token through a static identity catalog and
//! computes spot/perps arbitrage metrics over the result.
//!
//! # Architecture
//!
//! Each refresh is a pure function of (snapshot, catalog, parameters):
//!
//! - **`source`** - one normalizer per payload shape, rebasing every rate to a
//!   per-hour fraction and resolving native keys through the catalog
//! - **`domain::join`** - merges records into one `TokenBundle` per token
//! - **`domain::calculator`** - pluggable calculators, one per scenario family
//!   - `LeveragedSpotCalculator` - borrow/lend carry of a leveraged position
//!   - `SpotPerpsCalculator` - leveraged spot hedged with a perp
//!   - `PerpsPerpsCalculator` - funding spread between two perp venues
//!   - `best_per_group` - cheapest spot leg per asset group across leverage
//! - **`domain::rank`** - scales to a display interval and orders the results
//!
//! # Modules
//!
//! - [`adapter`] - HTTP and snapshot-directory feeds behind `SnapshotSource`
//! - [`cli`] - `clap` commands and terminal output
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Source-agnostic types: rates, catalog, bundles, opportunities
//! - [`engine`] - Wires one refresh cycle together
//! - [`error`] - Error types for the crate
//! - [`source`] - Payload normalizers
//!
//! # Example
//!
//! ```
//! use ratearb::domain::TokenCatalog;
//! use ratearb::engine::{AnalysisParams, Engine, Snapshot};
//! use ratearb::source::{SourceDefaults, SourcePayload};
//! use serde_json::json;
//!
//! let catalog = TokenCatalog::parse_toml(r#"
//! [[tokens]]
//! token_id = "SOL"
//! perps = [{ protocol = "hyperliquid", symbol = "SOL" }]
//! "#).unwrap();
//!
//! let payload = SourcePayload::Hyperliquid(json!([
//!     ["SOL", [["HlPerp", { "fundingRate": "0.0000125", "fundingIntervalHours": 1 }],
//!              ["BinPerp", { "fundingRate": "0.0001", "fundingIntervalHours": 8 }]]]
//! ]));
//!
//! let engine = Engine::new(catalog, SourceDefaults::default());
//! let analysis = engine.analyze(&Snapshot::new(vec![payload]), &AnalysisParams::default());
//! assert_eq!(analysis.opportunities.len(), 1);
//! ```

pub mod adapter;
pub mod cli;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod source;
