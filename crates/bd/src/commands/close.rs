//! `bd close` -- close one or more issues.

use anyhow::{bail, Context, Result};
use beads_core::enums::Status;

use crate::cli::CloseArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, populate_labels_via_store};

/// Execute the `bd close` command.
pub fn run(ctx: &RuntimeContext, args: &CloseArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot close issues in read-only mode");
    }
    if args.ids.is_empty() {
        bail!("no issue ID provided");
    }

    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let reason = args.reason.as_deref().unwrap_or("Closed");
    let mut closed_ids: Vec<String> = Vec::new();

    for id in &args.ids {
        let resolved = store.resolve_id(id)?.unwrap_or_else(|| id.clone());
        let issue = match store.get_issue(&resolved) {
            Ok(issue) => issue,
            Err(_) => {
                eprintln!("Issue {} not found", id);
                continue;
            }
        };

        if issue.status == Status::Closed {
            eprintln!("Issue {} is already closed", id);
            continue;
        }

        if issue.pinned && !args.force {
            eprintln!(
                "cannot close {}: issue is pinned (use --force to override)",
                id
            );
            continue;
        }

        if !args.force {
            let blockers: Vec<_> = store
                .get_dependencies(&resolved)?
                .into_iter()
                .filter(|dep| dep.status != Status::Closed)
                .collect();
            if !blockers.is_empty() {
                eprintln!(
                    "cannot close {}: blocked by {} open dependencies (use --force to override)",
                    id,
                    blockers.len()
                );
                continue;
            }
        }

        store.close_issue(&resolved, reason, &ctx.actor, "")?;
        closed_ids.push(resolved.clone());

        if !ctx.json {
            println!("Closed {}: {}", resolved, reason);
        }
    }

    ctx.auto_flush(&store)?;

    if ctx.json {
        let mut issues = Vec::new();
        for id in &closed_ids {
            if let Ok(issue) = store.get_issue(id) {
                issues.push(issue);
            }
        }
        populate_labels_via_store(&store, &mut issues);
        output_json(&issues);
    }

    Ok(())
}
