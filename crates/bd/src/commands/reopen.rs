//! `bd reopen` -- reopen a closed issue.

use anyhow::{bail, Context, Result};

use beads_core::enums::Status;

use crate::cli::ReopenArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd reopen` command.
pub fn run(ctx: &RuntimeContext, args: &ReopenArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot reopen issues in read-only mode");
    }

    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let resolved = store.resolve_id(&args.id)?.unwrap_or_else(|| args.id.clone());
    let issue = store.get_issue(&resolved)?;

    if issue.status != Status::Closed {
        bail!("issue {} is not closed", resolved);
    }

    store.reopen_issue(&resolved, &ctx.actor)?;
    ctx.auto_flush(&store)?;

    if ctx.json {
        let mut issue = store.get_issue(&resolved)?;
        issue.labels = store.get_labels(&resolved)?;
        output_json(&issue);
    } else if !ctx.quiet {
        println!("Reopened {}", resolved);
    }

    Ok(())
}
