//! Triage commands - comments, tags, removal and annotation status

use super::not_found;
use crate::cli::{CliContext, OutputFormatter};
use crate::store::TagCode;
use clap::Args;

#[derive(Debug, Args)]
pub struct CommentArgs {
    /// Survey object ID of the transient
    pub object_id: String,
    /// The comment text
    pub comment: String,
}

#[derive(Debug, Args)]
pub struct TagArgs {
    /// Survey object ID of the transient
    pub object_id: String,
    /// followup (0), favored (1), new (2) or removed (4)
    pub tag: TagCode,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Survey object ID of the transient
    pub object_id: String,
}

#[derive(Debug, Args)]
pub struct AnnotateArgs {
    /// Survey object ID of the transient
    pub object_id: String,
    /// Clear the annotation flag instead of setting it
    #[arg(long)]
    pub clear: bool,
}

fn report(formatter: &OutputFormatter, object_id: &str, applied: bool, what: &str) {
    if applied {
        formatter.success(&format!("{} for object ID: {}", what, object_id));
    } else {
        formatter.error(&not_found(object_id));
    }
}

pub fn execute_comment(ctx: &CliContext, args: CommentArgs) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let mut store = ctx.open_store()?;
    let applied = store.add_comment(&args.object_id, &args.comment)?;
    report(&formatter, &args.object_id, applied, "Comment added");
    Ok(())
}

pub fn execute_tag(ctx: &CliContext, args: TagArgs) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let mut store = ctx.open_store()?;
    let applied = store.add_tag(&args.object_id, args.tag)?;
    report(
        &formatter,
        &args.object_id,
        applied,
        &format!("Tag '{}' added", args.tag),
    );
    Ok(())
}

pub fn execute_remove(ctx: &CliContext, args: RemoveArgs) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let mut store = ctx.open_store()?;
    let applied = store.mark_removed(&args.object_id)?;
    report(&formatter, &args.object_id, applied, "Marked as removed");
    Ok(())
}

pub fn execute_annotate(ctx: &CliContext, args: AnnotateArgs) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);
    let mut store = ctx.open_store()?;
    let applied = store.set_annotation_status(&args.object_id, !args.clear)?;
    let what = if args.clear {
        "Annotation cleared"
    } else {
        "Annotation recorded"
    };
    report(&formatter, &args.object_id, applied, what);
    Ok(())
}
