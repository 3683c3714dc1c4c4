//! `ratearb exclusions`: what the last analysis left out, and why.

use serde_json::json;

use super::{output, pipeline, table, SnapshotArgs};
use crate::error::Result;

pub async fn execute(args: &SnapshotArgs, verbose: u8) -> Result<()> {
    let session = pipeline::prepare(args, verbose).await?;
    let params = session.config.analysis_params();
    let analysis = session.engine.analyze(&session.snapshot, &params);
    let report = &analysis.exclusions;

    if output::is_json() {
        output::json_output(json!({
            "type": "exclusions",
            "payload": serde_json::to_value(report)?,
        }));
        return Ok(());
    }

    output::header(env!("CARGO_PKG_VERSION"));
    if report.is_empty() {
        output::success("Nothing excluded");
        return Ok(());
    }

    let tables = table::exclusion_tables(report);
    for (title, rendered) in [
        ("Unresolved keys", tables.unresolved),
        ("Malformed records", tables.malformed),
        ("Skipped scenarios", tables.skipped),
    ] {
        if let Some(rendered) = rendered {
            output::section(title);
            output::lines(&rendered);
        }
    }
    Ok(())
}
