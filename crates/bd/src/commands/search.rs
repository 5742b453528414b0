//! `bd search` -- full-text search across issues.

use anyhow::{Context, Result};

use beads_core::enums::{IssueType, Status};
use beads_core::filter::IssueFilter;

use crate::cli::SearchArgs;
use crate::context::RuntimeContext;
use crate::output::{format_issue_row, output_json, output_table, populate_labels_via_store};

/// Execute the `bd search` command.
pub fn run(ctx: &RuntimeContext, args: &SearchArgs) -> Result<()> {
    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let mut filter = IssueFilter::default();
    if let Some(ref status) = args.status {
        filter.status = Some(Status::from(status.as_str()));
    }
    if let Some(ref t) = args.issue_type {
        filter.issue_type = Some(IssueType::from(t.as_str()).normalize());
    }
    if let Some(ref assignee) = args.assignee {
        filter.assignee = Some(assignee.clone());
    }
    filter.labels = args
        .labels
        .iter()
        .flat_map(|l| l.split(','))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    filter.limit = if args.limit > 0 { Some(args.limit) } else { None };

    let mut issues = store.search_issues(&args.query, &filter)?;
    if args.limit > 0 && issues.len() > args.limit as usize {
        issues.truncate(args.limit as usize);
    }

    ctx.auto_flush(&store)?;

    if ctx.json {
        populate_labels_via_store(&store, &mut issues);
        output_json(&issues);
    } else if issues.is_empty() {
        println!("No issues found matching '{}'", args.query);
    } else {
        println!("Found {} issues matching '{}':\n", issues.len(), args.query);
        let headers = &["ID", "PRI", "TYPE", "STATUS", "TITLE", "ASSIGNEE"];
        let rows: Vec<Vec<String>> = issues.iter().map(format_issue_row).collect();
        output_table(headers, &rows);
    }

    Ok(())
}
