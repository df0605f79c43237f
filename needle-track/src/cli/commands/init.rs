//! Init command - destructive store reset

use crate::cli::{CliContext, OutputFormatter};
use clap::Args;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Confirm that every stored record should be deleted
    #[arg(long)]
    pub force: bool,
}

pub fn execute(ctx: &CliContext, args: InitArgs) -> anyhow::Result<()> {
    let formatter = OutputFormatter::new(ctx.output_format);

    if !args.force {
        formatter.error(&format!(
            "Refusing to reset {} without --force (all records would be deleted)",
            ctx.db_path().display()
        ));
        anyhow::bail!("reset not confirmed");
    }

    let mut store = ctx.open_store()?;
    store.reset()?;
    formatter.success(&format!(
        "Initialized empty record store at {}",
        store.location()
    ));
    Ok(())
}
