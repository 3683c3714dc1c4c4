//! Command-line interface definitions.

pub mod check;
pub mod exclusions;
pub mod groups;
pub mod opportunities;
pub mod output;
pub mod rates;
pub mod table;

mod pipeline;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::calculator::ProxyPreference;
use crate::domain::{Interval, Leverage, Scenario, SortKey};
use crate::error::Result;
use output::OutputConfig;

/// Ratearb - funding, lending and staking rate arbitrage calculator.
#[derive(Parser, Debug)]
#[command(name = "ratearb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit machine-readable JSON lines on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Raise log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rank arbitrage opportunities across all scenarios
    Opportunities(OpportunitiesArgs),

    /// Show the cheapest spot leg per asset group across leverage levels
    Groups(GroupsArgs),

    /// Show the joined per-token rates
    Rates(RatesArgs),

    /// Show unresolved keys, malformed records and skipped scenarios
    Exclusions(SnapshotArgs),

    /// Validate configuration or catalog files
    #[command(subcommand)]
    Check(CheckCommand),
}

/// Subcommands for `ratearb check`
#[derive(Subcommand, Debug)]
pub enum CheckCommand {
    /// Validate the token catalog and list its identities
    Catalog(CatalogArgs),
    /// Validate configuration file
    Config(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Args, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,
}

/// Where the configuration and rate data come from.
#[derive(Args, Debug, Default)]
pub struct SnapshotArgs {
    /// Path to configuration file (defaults apply when `config.toml` is absent)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read feeds from a directory of JSON files instead of the network
    #[arg(long)]
    pub snapshot_dir: Option<PathBuf>,
}

/// Arguments for the `opportunities` subcommand.
#[derive(Args, Debug, Default)]
pub struct OpportunitiesArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Display interval (1h, 4h, 8h, 24h, 1y)
    #[arg(short, long)]
    pub interval: Option<Interval>,

    /// Leverage of spot legs
    #[arg(short, long)]
    pub leverage: Option<Leverage>,

    /// Restrict to a scenario (repeatable)
    #[arg(long = "scenario")]
    pub scenarios: Vec<Scenario>,

    /// Sort order (most-favorable, magnitude, token)
    #[arg(long)]
    pub sort: Option<SortKey>,

    /// Pair spot legs with this quote asset (e.g. USDC)
    #[arg(long)]
    pub quote: Option<String>,

    /// Funding choice when a token and its group base both have perps
    #[arg(long)]
    pub proxy: Option<ProxyPreference>,

    /// Show only the first N opportunities
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print the component breakdown of each opportunity
    #[arg(long)]
    pub breakdown: bool,
}

/// Arguments for the `groups` subcommand.
#[derive(Args, Debug, Default)]
pub struct GroupsArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Display interval (1h, 4h, 8h, 24h, 1y)
    #[arg(short, long)]
    pub interval: Option<Interval>,

    /// Highest leverage level to try (defaults to the configured maximum)
    #[arg(long)]
    pub max_leverage: Option<Leverage>,

    /// Pair spot legs with this quote asset (e.g. USDC)
    #[arg(long)]
    pub quote: Option<String>,

    /// Print the component breakdown of each group's spot leg
    #[arg(long)]
    pub breakdown: bool,
}

/// Arguments for the `rates` subcommand.
#[derive(Args, Debug, Default)]
pub struct RatesArgs {
    #[command(flatten)]
    pub snapshot: SnapshotArgs,

    /// Display interval (1h, 4h, 8h, 24h, 1y)
    #[arg(short, long)]
    pub interval: Option<Interval>,
}

/// Arguments for the `check catalog` subcommand.
#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Path to configuration file naming the catalog
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Catalog file to check instead of the configured one
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Opportunities(args) => opportunities::execute(&args, cli.verbose).await,
        Commands::Groups(args) => groups::execute(&args, cli.verbose).await,
        Commands::Rates(args) => rates::execute(&args, cli.verbose).await,
        Commands::Exclusions(args) => exclusions::execute(&args, cli.verbose).await,
        Commands::Check(CheckCommand::Catalog(args)) => check::catalog(&args, cli.verbose),
        Commands::Check(CheckCommand::Config(args)) => check::config(&args.config, cli.verbose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_opportunity_flags() {
        let cli = Cli::try_parse_from([
            "ratearb",
            "opportunities",
            "--snapshot-dir",
            "snap",
            "--interval",
            "24h",
            "--leverage",
            "2",
            "--scenario",
            "spot-vs-perps-long",
            "--scenario",
            "perps-vs-perps",
            "--breakdown",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        let Commands::Opportunities(args) = cli.command else {
            panic!("expected opportunities");
        };
        assert_eq!(args.snapshot.snapshot_dir, Some(PathBuf::from("snap")));
        assert_eq!(args.interval, Some(Interval::OneDay));
        assert_eq!(args.leverage.map(Leverage::value), Some(dec!(2)));
        assert_eq!(args.scenarios, vec![Scenario::SpotVsPerpsLong, Scenario::PerpsVsPerps]);
        assert!(args.breakdown);
    }

    #[test]
    fn parses_group_sweep_flags() {
        let cli = Cli::try_parse_from(["ratearb", "groups", "--max-leverage", "3x", "--quote", "usdc"]).unwrap();

        let Commands::Groups(args) = cli.command else {
            panic!("expected groups");
        };
        assert_eq!(args.max_leverage.map(Leverage::value), Some(dec!(3)));
        assert_eq!(args.quote.as_deref(), Some("usdc"));
        assert_eq!(args.interval, None);
    }

    #[test]
    fn rejects_sub_unit_leverage() {
        let result = Cli::try_parse_from(["ratearb", "opportunities", "--leverage", "0.5"]);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_interval() {
        let result = Cli::try_parse_from(["ratearb", "rates", "--interval", "3h"]);
        assert!(result.is_err());
    }

    #[test]
    fn counts_verbosity() {
        let cli = Cli::try_parse_from(["ratearb", "-vv", "check", "config"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Check(CheckCommand::Config(_))));
    }
}
