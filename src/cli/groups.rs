//! `ratearb groups`: cheapest spot leg per asset group.

use rust_decimal::Decimal;
use serde_json::json;

use super::{output, pipeline, table, GroupsArgs};
use crate::config::Config;
use crate::domain::calculator::SpotFraming;
use crate::domain::TokenId;
use crate::engine::AnalysisParams;
use crate::error::Result;

impl GroupsArgs {
    /// Analysis parameters and the top leverage level to sweep.
    pub fn params(&self, config: &Config) -> Result<(AnalysisParams, Decimal)> {
        let mut params = config.analysis_params();
        if let Some(interval) = self.interval {
            params.interval = interval;
        }
        if let Some(quote) = &self.quote {
            params.calc.framing = SpotFraming::Quote(TokenId::new(quote.trim().to_ascii_uppercase()));
        }

        let max_leverage = match self.max_leverage {
            Some(leverage) => config.calculation.check_leverage(leverage)?.value(),
            None => config.calculation.max_leverage,
        };
        Ok((params, max_leverage))
    }
}

pub async fn execute(args: &GroupsArgs, verbose: u8) -> Result<()> {
    let session = pipeline::prepare(&args.snapshot, verbose).await?;
    let (params, max_leverage) = args.params(&session.config)?;
    let analysis = session.engine.best_by_group(&session.snapshot, &params, max_leverage);

    if output::is_json() {
        output::json_output(json!({
            "type": "groups",
            "payload": {
                "interval": analysis.interval,
                "max_leverage": analysis.max_leverage,
                "fetched_at": analysis.fetched_at,
                "groups": serde_json::to_value(&analysis.groups)?,
                "skipped": analysis.exclusions.skipped().len(),
            },
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Interval", params.interval);
    output::field("Leverage", format!("1x to {max_leverage}x"));
    if let SpotFraming::Quote(quote) = &params.calc.framing {
        output::field("Quote", quote);
    }

    output::section("Asset groups");
    if analysis.groups.is_empty() {
        output::note("No asset group has a usable spot leg in this snapshot.");
        output::hint("groups come from the catalog's [[groups]] tables");
        return Ok(());
    }
    output::lines(&table::groups_table(&analysis.groups));
    if analysis.groups.iter().flat_map(|entry| &entry.hedges).any(|hedge| hedge.opportunity.uses_proxy()) {
        output::note("* member leg hedged on the group base's perp");
    }

    if args.breakdown {
        for entry in &analysis.groups {
            output::section(&format!("{} {} ({})", entry.group, entry.direction, entry.spot.opportunity.venue_label()));
            output::lines(&table::breakdown_table(&entry.spot));
        }
    }

    if !analysis.exclusions.skipped().is_empty() {
        println!();
        output::hint(&format!(
            "{} group scenario(s) skipped; run `ratearb exclusions` for per-token detail",
            analysis.exclusions.skipped().len()
        ));
    }
    Ok(())
}
