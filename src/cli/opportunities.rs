//! `ratearb opportunities`: rank arbitrage opportunities.

use serde_json::json;

use super::{output, pipeline, table, OpportunitiesArgs};
use crate::config::Config;
use crate::domain::calculator::SpotFraming;
use crate::domain::{RankedOpportunity, TokenId};
use crate::engine::AnalysisParams;
use crate::error::Result;

impl OpportunitiesArgs {
    /// Configured parameters with command-line overrides applied.
    pub fn params(&self, config: &Config) -> Result<AnalysisParams> {
        let mut params = config.analysis_params();

        if let Some(interval) = self.interval {
            params.interval = interval;
        }
        if let Some(leverage) = self.leverage {
            params.calc.leverage = config.calculation.check_leverage(leverage)?;
        }
        if !self.scenarios.is_empty() {
            params.calc.scenarios = self.scenarios.iter().copied().collect();
        }
        if let Some(sort) = self.sort {
            params.sort = sort;
        }
        if let Some(quote) = &self.quote {
            params.calc.framing = SpotFraming::Quote(TokenId::new(quote.trim().to_ascii_uppercase()));
        }
        if let Some(proxy) = self.proxy {
            params.calc.proxy = proxy;
        }
        Ok(params)
    }
}

fn net_rate(entry: &RankedOpportunity) -> String {
    let text = format!("{:.4}%", entry.percent());
    if entry.is_yield() {
        output::positive(text)
    } else if entry.scaled_rate.is_zero() {
        text
    } else {
        output::negative(text)
    }
}

pub async fn execute(args: &OpportunitiesArgs, verbose: u8) -> Result<()> {
    let session = pipeline::prepare(&args.snapshot, verbose).await?;
    let params = args.params(&session.config)?;
    let analysis = session.engine.analyze(&session.snapshot, &params);

    let shown = args.limit.unwrap_or(analysis.opportunities.len());
    let opportunities = &analysis.opportunities[..shown.min(analysis.opportunities.len())];

    if output::is_json() {
        output::json_output(json!({
            "type": "opportunities",
            "payload": {
                "interval": analysis.interval,
                "leverage": params.calc.leverage,
                "fetched_at": analysis.fetched_at,
                "opportunities": serde_json::to_value(opportunities)?,
                "skipped": analysis.exclusions.skipped().len(),
            },
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Interval", params.interval);
    output::field("Leverage", params.calc.leverage);
    output::field("Sort", params.sort);
    if let SpotFraming::Quote(quote) = &params.calc.framing {
        output::field("Quote", quote);
    }
    if let Some(fetched_at) = analysis.fetched_at {
        output::field("Fetched", fetched_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    output::section("Opportunities");
    if opportunities.is_empty() {
        output::note("No opportunities could be computed from this snapshot.");
        output::hint("run `ratearb exclusions` to see what was skipped");
        return Ok(());
    }
    output::lines(&table::opportunities_table(opportunities));
    if opportunities.iter().any(|entry| entry.opportunity.uses_proxy()) {
        output::note("* funding taken from the asset-group base market");
    }

    if args.breakdown {
        for (index, entry) in opportunities.iter().enumerate() {
            let opportunity = &entry.opportunity;
            output::section(&format!(
                "#{} {} {} ({})",
                index + 1,
                opportunity.token_id(),
                opportunity.scenario(),
                opportunity.venue_label()
            ));
            output::lines(&table::breakdown_table(entry));
            output::field(&format!("Net {}", entry.interval), net_rate(entry));
            output::field("APY", format!("{:.2}%", entry.apy_percent()));
        }
    } else if let Some(best) = opportunities.first() {
        println!();
        output::field(
            "Top",
            format!(
                "{} {} {}",
                output::highlight(best.opportunity.token_id()),
                best.opportunity.scenario(),
                net_rate(best)
            ),
        );
    }

    if !analysis.exclusions.is_empty() {
        println!();
        output::hint(&format!(
            "{} scenario(s) skipped, {} key(s) unresolved; run `ratearb exclusions` for details",
            analysis.exclusions.skipped().len(),
            analysis.exclusions.unresolved().len()
        ));
    }
    Ok(())
}
