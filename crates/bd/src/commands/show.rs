//! `bd show` -- display issue details.

use anyhow::{bail, Context, Result};

use beads_core::issue::Issue;

use crate::cli::ShowArgs;
use crate::context::RuntimeContext;
use crate::output::{format_issue_compact, format_issue_detail, output_json};

/// Execute the `bd show` command.
pub fn run(ctx: &RuntimeContext, args: &ShowArgs) -> Result<()> {
    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let mut found_count = 0;
    let mut all_issues: Vec<Issue> = Vec::new();

    for id in &args.ids {
        let resolved = store.resolve_id(id)?.unwrap_or_else(|| id.clone());
        match store.get_issue(&resolved) {
            Ok(mut issue) => {
                issue.labels = store.get_labels(&resolved)?;
                found_count += 1;
                all_issues.push(issue);
            }
            Err(_) => {
                eprintln!("Issue {} not found", id);
            }
        }
    }

    ctx.auto_flush(&store)?;

    if ctx.json {
        if all_issues.is_empty() {
            bail!("no issues found matching the provided IDs");
        }
        output_json(&all_issues);
    } else if args.short {
        for issue in &all_issues {
            println!("{}", format_issue_compact(issue));
        }
    } else {
        for (i, issue) in all_issues.iter().enumerate() {
            if i > 0 {
                println!("\n{}\n", "-".repeat(60));
            }
            println!("{}", format_issue_detail(issue));
            println!();
        }
    }

    if found_count == 0 && !ctx.json {
        std::process::exit(1);
    }

    Ok(())
}
