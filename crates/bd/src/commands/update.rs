//! `bd update` -- update issue fields.

use anyhow::{bail, Context, Result};

use beads_core::enums::{IssueType, Status};
use beads_storage::IssueUpdates;

use crate::cli::UpdateArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd update` command.
pub fn run(ctx: &RuntimeContext, args: &UpdateArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot update issues in read-only mode");
    }

    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let resolved = store.resolve_id(&args.id)?.unwrap_or_else(|| args.id.clone());
    store.get_issue(&resolved)?;

    let mut updates = IssueUpdates::default();
    let mut changes: Vec<String> = Vec::new();

    if let Some(ref title) = args.title {
        updates.title = Some(title.clone());
        changes.push(format!("title -> {}", title));
    }
    if let Some(ref desc) = args.description {
        updates.description = Some(desc.clone());
        changes.push("description updated".to_string());
    }
    if let Some(ref t) = args.issue_type {
        let normalized = IssueType::from(t.as_str()).normalize();
        updates.issue_type = Some(normalized.clone());
        changes.push(format!("type -> {}", normalized));
    }
    if let Some(ref p) = args.priority {
        let priority = parse_priority(p)?;
        updates.priority = Some(priority);
        changes.push(format!("priority -> P{}", priority));
    }
    if let Some(ref assignee) = args.assignee {
        updates.assignee = Some(assignee.clone());
        changes.push(format!("assignee -> {}", assignee));
    }
    if let Some(ref status) = args.status {
        let status = Status::from(status.as_str());
        updates.status = Some(status.clone());
        changes.push(format!("status -> {}", status));
    }

    if changes.is_empty() && args.add_labels.is_empty() && args.remove_labels.is_empty() {
        bail!(
            "no fields to update. Specify at least one field flag (--title, --description, --type, --priority, --assignee, --status, --add-label, --remove-label)"
        );
    }

    if !changes.is_empty() {
        store
            .update_issue(&resolved, &updates, &ctx.actor)
            .with_context(|| format!("failed to update issue {}", resolved))?;
    }

    for label in &args.add_labels {
        for l in label.split(',').map(str::trim).filter(|l| !l.is_empty()) {
            store.add_label(&resolved, l, &ctx.actor)?;
            changes.push(format!("+label:{}", l));
        }
    }
    for label in &args.remove_labels {
        for l in label.split(',').map(str::trim).filter(|l| !l.is_empty()) {
            store.remove_label(&resolved, l, &ctx.actor)?;
            changes.push(format!("-label:{}", l));
        }
    }

    ctx.auto_flush(&store)?;

    if ctx.json {
        let mut issue = store.get_issue(&resolved)?;
        issue.labels = store.get_labels(&resolved)?;
        output_json(&vec![issue]);
    } else if !ctx.quiet {
        println!("Updated {}", resolved);
        for change in &changes {
            println!("  {}", change);
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
