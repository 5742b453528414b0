//! `bd sync` -- reconcile the SQLite store with the shared JSONL log.
//!
//! Imports any pending external changes from `issues.jsonl`, then flushes
//! locally dirty issues back out. With `--flush-only`, skips the import
//! half and only exports.

use anyhow::{Context, Result};

use crate::cli::SyncArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd sync` command.
pub fn run(ctx: &RuntimeContext, args: &SyncArgs) -> Result<()> {
    let store = ctx
        .open_store()
        .context("no beads database found. Run 'bd init' to create one.")?;
    let jsonl_path = ctx
        .jsonl_path()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let report = if args.flush_only {
        None
    } else {
        Some(beads_storage::import_jsonl(&store, &jsonl_path)?)
    };

    let flushed = beads_storage::flush_to_jsonl(&store, &jsonl_path)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "imported": report.as_ref().map(|r: &beads_storage::ImportReport| serde_json::json!({
                "created": r.created,
                "updated": r.updated,
                "unchanged": r.unchanged,
                "skipped": r.skipped,
                "deleted": r.deleted,
            })),
            "exported": flushed,
        }));
    } else if !ctx.quiet {
        if let Some(r) = &report {
            println!(
                "Imported: {} created, {} updated, {} unchanged, {} deleted",
                r.created, r.updated, r.unchanged, r.deleted
            );
        }
        println!("Exported {} issue(s) to {}", flushed, jsonl_path.display());
    }

    Ok(())
}
