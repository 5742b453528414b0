//! `bd blocked` -- show issues blocked by open dependencies.

use anyhow::{Context, Result};

use beads_core::enums::Status;
use beads_core::filter::WorkFilter;

use crate::cli::BlockedArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd blocked` command.
pub fn run(ctx: &RuntimeContext, args: &BlockedArgs) -> Result<()> {
    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let mut filter = WorkFilter::default();
    if let Some(ref assignee) = args.assignee {
        filter.assignee = Some(assignee.clone());
    }

    let mut blocked = store.get_blocked_issues(&filter)?;
    blocked.retain(|b| b.issue.status != Status::Closed);
    if args.limit > 0 && blocked.len() > args.limit as usize {
        blocked.truncate(args.limit as usize);
    }

    ctx.auto_flush(&store)?;

    if ctx.json {
        let view: Vec<serde_json::Value> = blocked
            .iter()
            .map(|b| {
                serde_json::json!({
                    "id": b.issue.id,
                    "title": b.issue.title,
                    "status": b.issue.status.as_str(),
                    "priority": b.issue.priority,
                    "type": b.issue.issue_type.as_str(),
                    "blocked_by": b.blocked_by,
                })
            })
            .collect();
        output_json(&view);
        return Ok(());
    }

    if blocked.is_empty() {
        println!("\nNo blocked issues found\n");
        return Ok(());
    }

    println!("\nBlocked issues ({}):\n", blocked.len());
    for b in &blocked {
        println!(
            "[P{}] [{}] {}: {} (blocked by {})",
            b.issue.priority,
            b.issue.issue_type,
            b.issue.id,
            b.issue.title,
            b.blocked_by.join(", ")
        );
    }
    println!();

    Ok(())
}
