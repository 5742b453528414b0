//! `bd ready` -- show ready work items (open, no active blockers).

use anyhow::{Context, Result};

use beads_core::enums::{IssueType, SortPolicy, Status};
use beads_core::filter::WorkFilter;

use crate::cli::ReadyArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd ready` command.
pub fn run(ctx: &RuntimeContext, args: &ReadyArgs) -> Result<()> {
    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let mut filter = WorkFilter {
        status: Some(Status::Open),
        sort_policy: match args.sort.as_str() {
            "oldest" => SortPolicy::Oldest,
            "hybrid" => SortPolicy::Hybrid,
            _ => SortPolicy::Priority,
        },
        ..WorkFilter::default()
    };

    if args.unassigned {
        filter.unassigned = true;
    } else if let Some(ref assignee) = args.assignee {
        filter.assignee = Some(assignee.clone());
    }
    filter.priority = args.priority;
    if let Some(ref t) = args.issue_type {
        filter.issue_type = Some(IssueType::from(t.as_str()).normalize().as_str().to_string());
    }
    filter.labels = args
        .labels
        .iter()
        .flat_map(|l| l.split(','))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if args.limit > 0 {
        filter.limit = Some(args.limit);
    }

    let mut issues = store.get_ready_work(&filter)?;
    if args.limit > 0 && issues.len() > args.limit as usize {
        issues.truncate(args.limit as usize);
    }

    ctx.auto_flush(&store)?;

    if ctx.json {
        output_json(&issues);
        return Ok(());
    }

    if issues.is_empty() {
        println!("\nNo ready work found\n");
        return Ok(());
    }

    println!(
        "\nReady work ({} issues with no active blockers):\n",
        issues.len()
    );
    for (i, issue) in issues.iter().enumerate() {
        println!(
            "{}. [P{}] [{}] {}: {}",
            i + 1,
            issue.priority,
            issue.issue_type,
            issue.id,
            issue.title
        );
        if let Some(ref est) = issue.estimated_minutes {
            println!("   Estimate: {} min", est);
        }
        if !issue.assignee.is_empty() {
            println!("   Assignee: {}", issue.assignee);
        }
    }
    println!();

    Ok(())
}
