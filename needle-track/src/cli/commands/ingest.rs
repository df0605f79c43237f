//! Ingest command - reconcile a JSON export into the record store

use crate::cli::{CliContext, OutputFormatter};
use crate::ingest::{OnMalformed, Reconciler};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Path to the JSON file with transient data (an array of objects)
    pub json_file: PathBuf,

    /// Skip records without a usable object ID instead of rejecting the batch
    #[arg(long)]
    pub skip_malformed: bool,
}

pub fn execute(ctx: &CliContext, args: IngestArgs) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let mut store = ctx.open_store()?;

    let mut policy = ctx.config.ingest.on_malformed;
    if args.skip_malformed {
        policy = OnMalformed::Skip;
    }

    ctx.status(&format!("Ingesting {}", args.json_file.display()));
    let report = Reconciler::from_config(&mut store, &ctx.config.ingest)
        .on_malformed(policy)
        .ingest_file(&args.json_file)?;

    formatter.report(&report);
    if report.skipped > 0 {
        formatter.warning(&format!(
            "{} malformed record(s) skipped; run with --verbose for details",
            report.skipped
        ));
    }
    Ok(())
}
