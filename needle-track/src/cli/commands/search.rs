//! Search and updates commands - read-only queries

use super::not_found;
use crate::cli::{CliContext, OutputFormatter};
use crate::store::TagMatch;
use clap::Args;

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search by survey object ID
    #[arg(
        long = "object-id",
        visible_alias = "objectId",
        conflicts_with_all = ["tag", "astronote"]
    )]
    pub object_id: Option<String>,

    /// Search by tag (substring of the stored tag list)
    #[arg(long, conflicts_with = "astronote")]
    pub tag: Option<String>,

    /// With --tag: require a tag equal to the query
    #[arg(long, requires = "tag")]
    pub exact: bool,

    /// Search for objects with an astronote annotation
    #[arg(long)]
    pub astronote: bool,

    /// With --astronote: list objects without an annotation instead
    #[arg(long, requires = "astronote")]
    pub missing: bool,
}

pub fn execute(ctx: &CliContext, args: SearchArgs) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    if args.object_id.is_none() && args.tag.is_none() && !args.astronote {
        formatter.error("Please provide a search parameter (--object-id, --tag, or --astronote).");
        anyhow::bail!("no search criterion given");
    }
    let store = ctx.open_store()?;

    if let Some(object_id) = args.object_id {
        match store.find_by_id(&object_id)? {
            Some(record) => formatter.record(&record),
            None => formatter.error(&not_found(&object_id)),
        }
    } else if let Some(tag) = args.tag {
        let mode = if args.exact {
            TagMatch::Exact
        } else {
            TagMatch::Substring
        };
        formatter.records(&store.find_by_tag(&tag, mode)?);
    } else {
        formatter.records(&store.find_by_annotation_status(!args.missing)?);
    }
    Ok(())
}

/// List transients whose properties changed on a later ingestion
pub fn execute_updates(ctx: &CliContext) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let store = ctx.open_store()?;
    formatter.records(&store.find_updated()?);
    Ok(())
}
