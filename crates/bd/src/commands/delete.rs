//! `bd delete` -- delete issues from the database.

use anyhow::{bail, Context, Result};

use crate::cli::DeleteArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd delete` command.
pub fn run(ctx: &RuntimeContext, args: &DeleteArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot delete issues in read-only mode");
    }

    if !args.force {
        bail!(
            "deletion is destructive and cannot be undone.\n\
            Use --force to confirm deletion of {} issue(s): {}",
            args.ids.len(),
            args.ids.join(", ")
        );
    }

    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let mut deleted_ids: Vec<String> = Vec::new();

    for id in &args.ids {
        let resolved = store.resolve_id(id)?.unwrap_or_else(|| id.clone());
        if store.get_issue(&resolved).is_err() {
            eprintln!("Issue {} not found", id);
            continue;
        }

        store.delete_issue(&resolved)?;
        deleted_ids.push(resolved.clone());

        if !ctx.json {
            println!("Deleted {}", resolved);
        }
    }

    ctx.auto_flush(&store)?;

    if ctx.json {
        output_json(&deleted_ids);
    }

    Ok(())
}
