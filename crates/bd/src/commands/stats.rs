//! `bd stats` -- show project statistics.

use anyhow::{Context, Result};

use crate::cli::StatsArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

/// Execute the `bd stats` command.
pub fn run(ctx: &RuntimeContext, _args: &StatsArgs) -> Result<()> {
    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let stats = store.get_statistics()?;
    ctx.auto_flush(&store)?;

    if ctx.json {
        let type_map: serde_json::Map<String, serde_json::Value> = stats
            .by_type
            .iter()
            .map(|(t, c)| (t.clone(), serde_json::json!(c)))
            .collect();
        let priority_map: serde_json::Map<String, serde_json::Value> = stats
            .by_priority
            .iter()
            .map(|(p, c)| (format!("P{}", p), serde_json::json!(c)))
            .collect();
        let assignee_map: serde_json::Map<String, serde_json::Value> = stats
            .by_assignee
            .iter()
            .map(|(a, c)| (a.clone(), serde_json::json!(c)))
            .collect();

        output_json(&serde_json::json!({
            "total": stats.total_issues,
            "open": stats.open_issues,
            "closed": stats.closed_issues,
            "in_progress": stats.in_progress_issues,
            "blocked": stats.blocked_issues,
            "deferred": stats.deferred_issues,
            "by_type": type_map,
            "by_priority": priority_map,
            "by_assignee": assignee_map,
        }));
    } else {
        println!("Project Statistics");
        println!("==================");
        println!();
        println!("Total issues: {}", stats.total_issues);
        println!("  Open:        {}", stats.open_issues);
        println!("  In Progress: {}", stats.in_progress_issues);
        println!("  Blocked:     {}", stats.blocked_issues);
        println!("  Deferred:    {}", stats.deferred_issues);
        println!("  Closed:      {}", stats.closed_issues);

        if !stats.by_type.is_empty() {
            println!();
            println!("By Type:");
            let headers = &["TYPE", "COUNT"];
            let rows: Vec<Vec<String>> = stats
                .by_type
                .iter()
                .map(|(t, c)| vec![t.clone(), c.to_string()])
                .collect();
            output_table(headers, &rows);
        }

        if !stats.by_priority.is_empty() {
            println!();
            println!("By Priority:");
            let headers = &["PRIORITY", "COUNT"];
            let rows: Vec<Vec<String>> = stats
                .by_priority
                .iter()
                .map(|(p, c)| vec![format!("P{}", p), c.to_string()])
                .collect();
            output_table(headers, &rows);
        }

        if !stats.by_assignee.is_empty() {
            println!();
            println!("By Assignee (top 10):");
            let headers = &["ASSIGNEE", "COUNT"];
            let rows: Vec<Vec<String>> = stats
                .by_assignee
                .iter()
                .map(|(a, c)| vec![a.clone(), c.to_string()])
                .collect();
            output_table(headers, &rows);
        }
    }

    Ok(())
}
