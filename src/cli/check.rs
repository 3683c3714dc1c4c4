//! Configuration and catalog validation commands.

use std::path::Path;

use serde_json::json;

use super::{output, pipeline, table, CatalogArgs};
use crate::domain::TokenCatalog;
use crate::error::Result;

/// Validate a configuration file and print its effective settings.
pub fn config(path: &Path, verbose: u8) -> Result<()> {
    let config = pipeline::load_config(Some(path), verbose)?;
    let calculation = &config.calculation;
    let scenarios: Vec<&str> = calculation.scenarios.iter().map(|s| s.as_str()).collect();

    if output::is_json() {
        output::json_output(json!({
            "type": "check_config",
            "payload": {
                "path": path.display().to_string(),
                "valid": true,
                "catalog": config.catalog.display().to_string(),
                "leverage": calculation.leverage,
                "max_leverage": calculation.max_leverage,
                "interval": calculation.interval,
                "scenarios": scenarios,
            },
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!("Configuration file is valid: {}", path.display()));

    output::section("Calculation");
    output::field("Leverage", calculation.leverage);
    output::field("Max leverage", format!("{}x", calculation.max_leverage));
    output::field("Interval", calculation.interval);
    output::field("Sort", calculation.sort);
    output::field("Scenarios", scenarios.join(", "));
    output::field("Framing", calculation.framing());
    output::field("Proxy", calculation.proxy_preference);

    output::section("Sources");
    output::field("Catalog", config.catalog.display());
    output::field("Hyperliquid", &config.sources.hyperliquid_url);
    output::field("Drift", &config.sources.drift_url);
    output::field("Lending", &config.sources.lending_url);
    output::field("Staking", &config.sources.staking_url);
    output::field("Timeout", format!("{}s", config.sources.timeout_secs));

    if !config.catalog.exists() {
        println!();
        output::warning(&format!("Catalog file not found: {}", config.catalog.display()));
        output::hint("run `ratearb check catalog` once it exists");
    }
    Ok(())
}

/// Validate the token catalog and list its identities.
pub fn catalog(args: &CatalogArgs, verbose: u8) -> Result<()> {
    let config = pipeline::load_config(args.config.as_deref(), verbose)?;
    let path = args.catalog.clone().unwrap_or(config.catalog);
    let catalog = TokenCatalog::load(&path)?;

    if output::is_json() {
        let groups: Vec<_> = catalog
            .groups()
            .map(|group| json!({ "name": group.name, "base": group.base }))
            .collect();
        output::json_output(json!({
            "type": "check_catalog",
            "payload": {
                "path": path.display().to_string(),
                "valid": true,
                "tokens": catalog.identities().map(|identity| identity.token_id.as_str()).collect::<Vec<_>>(),
                "groups": groups,
            },
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::success(&format!(
        "Catalog is valid: {} token(s), {} group(s)",
        catalog.len(),
        catalog.groups().count()
    ));
    output::field("Path", path.display());

    output::section("Tokens");
    output::lines(&table::catalog_table(&catalog));
    Ok(())
}
