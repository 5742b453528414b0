//! `bd label` -- manage labels on an issue.

use anyhow::{bail, Context, Result};

use crate::cli::{LabelArgs, LabelCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd label` command.
pub fn run(ctx: &RuntimeContext, args: &LabelArgs) -> Result<()> {
    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let resolved = store.resolve_id(&args.id)?.unwrap_or_else(|| args.id.clone());
    store.get_issue(&resolved)?;

    match &args.command {
        LabelCommands::Add(add_args) => {
            if ctx.readonly {
                bail!("cannot add labels in read-only mode");
            }
            store
                .add_label(&resolved, &add_args.label, &ctx.actor)
                .with_context(|| format!("failed to add label '{}' to {}", add_args.label, resolved))?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "status": "added",
                    "issue_id": resolved,
                    "label": add_args.label,
                }));
            } else if !ctx.quiet {
                println!("Added label '{}' to {}", add_args.label, resolved);
            }
        }

        LabelCommands::Remove(remove_args) => {
            if ctx.readonly {
                bail!("cannot remove labels in read-only mode");
            }
            let before = store.get_labels(&resolved)?;
            store.remove_label(&resolved, &remove_args.label, &ctx.actor)?;
            let removed = before.contains(&remove_args.label);

            if ctx.json {
                output_json(&serde_json::json!({
                    "status": "removed",
                    "issue_id": resolved,
                    "label": remove_args.label,
                    "removed": removed,
                }));
            } else if removed {
                if !ctx.quiet {
                    println!("Removed label '{}' from {}", remove_args.label, resolved);
                }
            } else {
                eprintln!("Label '{}' not found on {}", remove_args.label, resolved);
            }
        }

        LabelCommands::List => {
            let labels = store.get_labels(&resolved)?;
            if ctx.json {
                output_json(&labels);
            } else if labels.is_empty() {
                println!("{} has no labels", resolved);
            } else {
                println!("Labels for {}:", resolved);
                for label in &labels {
                    println!("  - {}", label);
                }
            }
        }
    }

    ctx.auto_flush(&store)?;
    Ok(())
}
