//! `ratearb rates`: the joined per-token rate view.

use serde_json::json;

use super::{output, pipeline, table, RatesArgs};
use crate::error::Result;

pub async fn execute(args: &RatesArgs, verbose: u8) -> Result<()> {
    let session = pipeline::prepare(&args.snapshot, verbose).await?;
    let interval = args.interval.unwrap_or(session.config.calculation.interval);
    let (bundles, exclusions) = session.engine.bundles(&session.snapshot);

    if output::is_json() {
        output::json_output(json!({
            "type": "rates",
            "payload": {
                "interval": interval,
                "fetched_at": session.snapshot.fetched_at(),
                "bundles": serde_json::to_value(&bundles)?,
                "unresolved": exclusions.unresolved().len(),
                "malformed": exclusions.malformed().len(),
            },
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    output::field("Interval", interval);
    output::field("Tokens", bundles.len());

    output::section("Rates");
    if bundles.is_empty() {
        output::note("No catalog token has any rate in this snapshot.");
        return Ok(());
    }
    output::lines(&table::rates_table(&bundles, interval));
    output::note("- = not reported by any source");

    if !exclusions.unresolved().is_empty() || !exclusions.malformed().is_empty() {
        println!();
        output::hint(&format!(
            "{} key(s) unresolved, {} record(s) malformed; run `ratearb exclusions` for details",
            exclusions.unresolved().len(),
            exclusions.malformed().len()
        ));
    }
    Ok(())
}
