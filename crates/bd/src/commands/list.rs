//! `bd list` -- list issues with filtering and formatting.

use anyhow::{Context, Result};

use beads_core::enums::{IssueType, Status};
use beads_core::filter::IssueFilter;
use beads_storage::SortKey;

use crate::cli::ListArgs;
use crate::context::RuntimeContext;
use crate::output::{format_issue_detail, format_issue_row, output_json, output_table, populate_labels_via_store};

/// Execute the `bd list` command.
pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let mut filter = IssueFilter::default();

    if let Some(ref status) = args.status {
        if status != "all" {
            filter.status = Some(Status::from(status.as_str()));
        }
    } else if !args.all {
        filter.exclude_status = vec![Status::Closed];
    }

    if let Some(ref t) = args.issue_type {
        filter.issue_type = Some(IssueType::from(t.as_str()).normalize());
    }
    if let Some(ref assignee) = args.assignee {
        filter.assignee = Some(assignee.clone());
    }
    if let Some(ref p) = args.priority {
        filter.priority = Some(parse_priority(p)?);
    }
    filter.labels = args
        .labels
        .iter()
        .flat_map(|l| l.split(','))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    filter.labels_any = args
        .label_any
        .iter()
        .flat_map(|l| l.split(','))
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    // Exclude templates and gate-type scheduling issues from ordinary listings.
    filter.is_template = Some(false);
    filter.exclude_types = vec![IssueType::from("gate")];

    let sort_by = match args.sort.as_deref() {
        Some("created") => SortKey::Created,
        Some("updated") => SortKey::Updated,
        Some("status") => SortKey::Status,
        Some("id") => SortKey::Id,
        Some("title") => SortKey::Title,
        Some("type") => SortKey::Type,
        _ => SortKey::Priority,
    };

    let mut issues = store.list_issues(&filter, sort_by, args.reverse)?;
    if args.limit > 0 && issues.len() > args.limit as usize {
        issues.truncate(args.limit as usize);
    }

    ctx.auto_flush(&store)?;

    if ctx.json {
        populate_labels_via_store(&store, &mut issues);
        output_json(&issues);
    } else if args.long {
        populate_labels_via_store(&store, &mut issues);
        println!("\nFound {} issues:\n", issues.len());
        for issue in &issues {
            println!("{}", format_issue_detail(issue));
            println!();
        }
    } else {
        let headers = &["ID", "PRI", "TYPE", "STATUS", "TITLE", "ASSIGNEE"];
        let rows: Vec<Vec<String>> = issues.iter().map(|i| format_issue_row(i)).collect();
        output_table(headers, &rows);

        if args.limit > 0 && issues.len() == args.limit as usize {
            eprintln!("\nShowing {} issues (use --limit 0 for all)", args.limit);
        }
    }

    Ok(())
}

/// Parse a priority string.
fn parse_priority(s: &str) -> Result<i32> {
    let s = s.trim();
    let num_str = if s.starts_with('P') || s.starts_with('p') {
        &s[1..]
    } else {
        s
    };
    let p: i32 = num_str
        .parse()
        .with_context(|| format!("invalid priority '{}': expected 0-4 or P0-P4", s))?;
    if !(0..=4).contains(&p) {
        anyhow::bail!("priority must be between 0 and 4 (got {})", p);
    }
    Ok(p)
}
