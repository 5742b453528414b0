//! `bd comment` and `bd comments` -- add and list comments on issues.

use anyhow::{bail, Context, Result};

use crate::cli::{CommentArgs, CommentsArgs};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd comment` command (add a comment).
pub fn run_add(ctx: &RuntimeContext, args: &CommentArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot add comments in read-only mode");
    }

    let text = match &args.text {
        Some(t) => t.clone(),
        None => bail!("comment text required (editor mode not yet implemented)"),
    };
    if text.trim().is_empty() {
        bail!("comment text cannot be empty");
    }

    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let resolved = store.resolve_id(&args.id)?.unwrap_or_else(|| args.id.clone());
    store.get_issue(&resolved)?;

    let comment = store
        .add_comment(&resolved, &ctx.actor, &text)
        .with_context(|| format!("failed to add comment to {}", resolved))?;

    ctx.auto_flush(&store)?;

    if ctx.json {
        output_json(&serde_json::json!({
            "issue_id": resolved,
            "author": comment.author,
            "text": comment.text,
            "created_at": comment.created_at.to_rfc3339(),
        }));
    } else if !ctx.quiet {
        println!("Added comment to {}", resolved);
    }

    Ok(())
}

/// Execute the `bd comments` command (list comments).
pub fn run_list(ctx: &RuntimeContext, args: &CommentsArgs) -> Result<()> {
    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    let resolved = store.resolve_id(&args.id)?.unwrap_or_else(|| args.id.clone());
    store.get_issue(&resolved)?;

    let comments = store.get_comments(&resolved)?;
    ctx.auto_flush(&store)?;

    if ctx.json {
        let json_comments: Vec<serde_json::Value> = comments
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.id,
                    "issue_id": c.issue_id,
                    "author": c.author,
                    "text": c.text,
                    "created_at": c.created_at.to_rfc3339(),
                })
            })
            .collect();
        output_json(&json_comments);
    } else if comments.is_empty() {
        println!("No comments on {}", resolved);
    } else {
        println!("Comments on {}:\n", resolved);
        for c in &comments {
            println!("  {} {}", c.created_at.format("%Y-%m-%d %H:%M"), c.author);
            for line in c.text.lines() {
                println!("    {}", line);
            }
            println!();
        }
    }

    Ok(())
}
