//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all settings.
//! Configuration is loaded from a TOML file; every section is optional and
//! falls back to defaults, and command-line flags override file values.
//!
//! # Example
//!
//! ```no_run
//! use ratearb::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

pub mod logging;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

pub use logging::LoggingConfig;

use crate::domain::calculator::{CalcParams, ProxyPreference, SpotFraming};
use crate::domain::{Interval, Leverage, Scenario, SortKey, TokenId};
use crate::engine::AnalysisParams;
use crate::error::{ConfigError, Result};
use crate::source::SourceDefaults;

/// Endpoints and transport settings for the rate feeds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Predicted fundings endpoint (POST).
    pub hyperliquid_url: String,
    /// Perp markets endpoint.
    pub drift_url: String,
    /// Current lending rates endpoint.
    pub lending_url: String,
    /// Current staking rates endpoint.
    pub staking_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Retries after a timeout or connection failure.
    pub max_retries: u32,
    /// Delay before the first retry, doubled on each attempt.
    pub retry_backoff_ms: u64,
    /// Native interval of predicted fundings without their own interval.
    pub hyperliquid_interval_hours: u32,
    /// Native interval of the Drift funding figure.
    pub drift_interval_hours: u32,
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn defaults(&self) -> SourceDefaults {
        SourceDefaults {
            hyperliquid_interval_hours: self.hyperliquid_interval_hours,
            drift_interval_hours: self.drift_interval_hours,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        let intervals = SourceDefaults::default();
        Self {
            hyperliquid_url: "https://api-ui.hyperliquid.xyz/info".into(),
            drift_url: "https://mainnet-beta.api.drift.trade/markets24h".into(),
            lending_url: "https://historical-apy.asgard.finance/current-rates".into(),
            staking_url: "https://historical-apy.asgard.finance/current-staking-rates".into(),
            timeout_secs: 10,
            max_retries: 2,
            retry_backoff_ms: 500,
            hyperliquid_interval_hours: intervals.hyperliquid_interval_hours,
            drift_interval_hours: intervals.drift_interval_hours,
        }
    }
}

/// Default calculation parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalculationConfig {
    /// Leverage of spot legs.
    pub leverage: Leverage,
    /// Upper bound accepted for `leverage`, from file or command line.
    pub max_leverage: Decimal,
    /// Display interval.
    pub interval: Interval,
    pub sort: SortKey,
    /// Scenarios to compute.
    pub scenarios: Vec<Scenario>,
    /// Funding tie-break when a token and its group base both have perps.
    pub proxy_preference: ProxyPreference,
    /// Pair spot legs with this asset instead of the token itself.
    pub quote_asset: Option<String>,
}

impl CalculationConfig {
    /// Accept a leverage only within `1..=max_leverage`.
    pub fn check_leverage(&self, leverage: Leverage) -> Result<Leverage> {
        if leverage.value() > self.max_leverage {
            return Err(ConfigError::InvalidValue {
                field: "leverage",
                reason: format!("{leverage} exceeds max_leverage {}x", self.max_leverage),
            }
            .into());
        }
        Ok(leverage)
    }

    pub fn framing(&self) -> SpotFraming {
        match &self.quote_asset {
            Some(quote) => SpotFraming::Quote(TokenId::new(quote.trim().to_ascii_uppercase())),
            None => SpotFraming::SameAsset,
        }
    }
}

impl Default for CalculationConfig {
    fn default() -> Self {
        Self {
            leverage: Leverage::ONE,
            max_leverage: Decimal::from(5),
            interval: Interval::default(),
            sort: SortKey::default(),
            scenarios: Scenario::ALL.to_vec(),
            proxy_preference: ProxyPreference::default(),
            quote_asset: None,
        }
    }
}

/// Main application configuration.
///
/// Load from a TOML file using [`Config::load`] or parse directly with
/// [`Config::parse_toml`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the token catalog.
    pub catalog: PathBuf,

    /// Logging and tracing configuration.
    pub logging: LoggingConfig,

    /// Rate feed endpoints and transport settings.
    pub sources: SourcesConfig,

    /// Default calculation parameters.
    pub calculation: CalculationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("tokens.toml"),
            logging: LoggingConfig::default(),
            sources: SourcesConfig::default(),
            calculation: CalculationConfig::default(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML content is malformed or validation fails.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the content is malformed
    /// or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_toml(&content)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.catalog.as_os_str().is_empty() {
            return Err(ConfigError::MissingField { field: "catalog" }.into());
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::InvalidValue {
                field: "logging.format",
                reason: format!("'{}' is not one of pretty, json", self.logging.format),
            }
            .into());
        }

        let sources = &self.sources;
        for (field, url) in [
            ("sources.hyperliquid_url", &sources.hyperliquid_url),
            ("sources.drift_url", &sources.drift_url),
            ("sources.lending_url", &sources.lending_url),
            ("sources.staking_url", &sources.staking_url),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::MissingField { field }.into());
            }
        }
        if sources.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sources.timeout_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if sources.hyperliquid_interval_hours == 0 || sources.drift_interval_hours == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sources.*_interval_hours",
                reason: "funding intervals must be at least 1 hour".to_string(),
            }
            .into());
        }

        let calculation = &self.calculation;
        if calculation.max_leverage < Decimal::ONE {
            return Err(ConfigError::InvalidValue {
                field: "calculation.max_leverage",
                reason: "must be >= 1".to_string(),
            }
            .into());
        }
        calculation.check_leverage(calculation.leverage)?;
        if calculation.scenarios.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "calculation.scenarios",
                reason: "at least one scenario must be enabled".to_string(),
            }
            .into());
        }
        if calculation
            .quote_asset
            .as_deref()
            .is_some_and(|quote| quote.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "calculation.quote_asset",
                reason: "cannot be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Initialize the global tracing subscriber.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Analysis parameters from the configured defaults.
    pub fn analysis_params(&self) -> AnalysisParams {
        let calculation = &self.calculation;
        AnalysisParams {
            calc: CalcParams {
                leverage: calculation.leverage,
                scenarios: calculation.scenarios.iter().copied().collect::<BTreeSet<_>>(),
                framing: calculation.framing(),
                proxy: calculation.proxy_preference,
            },
            interval: calculation.interval,
            sort: calculation.sort,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();

        assert_eq!(config.catalog, PathBuf::from("tokens.toml"));
        assert_eq!(config.calculation.max_leverage, dec!(5));
        assert_eq!(config.analysis_params(), AnalysisParams::default());
    }

    #[test]
    fn parses_calculation_section() {
        let config = Config::parse_toml(
            r#"
[calculation]
leverage = 2.5
interval = "24h"
sort = "magnitude"
scenarios = ["perps-vs-perps"]
proxy_preference = "group-base"
quote_asset = "usdc"
"#,
        )
        .unwrap();

        let params = config.analysis_params();
        assert_eq!(params.calc.leverage.value(), dec!(2.5));
        assert_eq!(params.interval, Interval::OneDay);
        assert_eq!(params.sort, SortKey::Magnitude);
        assert_eq!(params.calc.scenarios.len(), 1);
        assert_eq!(params.calc.proxy, ProxyPreference::GroupBase);
        assert_eq!(params.calc.framing, SpotFraming::Quote("USDC".into()));
    }

    #[test]
    fn rejects_leverage_above_max() {
        let result = Config::parse_toml(
            r#"
[calculation]
leverage = 6
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_interval() {
        let result = Config::parse_toml(
            r#"
[calculation]
interval = "2h"
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let result = Config::parse_toml(
            r#"
[sources]
timeout_secs = 0
"#,
        );
        assert!(result.is_err());
    }
}
