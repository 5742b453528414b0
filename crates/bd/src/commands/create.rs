//! `bd create` -- create a new issue.

use anyhow::{bail, Context, Result};
use chrono::Utc;

use beads_core::dependency::Dependency;
use beads_core::enums::{DependencyType, IssueType, Status};
use beads_core::idgen;
use beads_core::issue::Issue;

use crate::cli::CreateArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd create` command.
pub fn run(ctx: &RuntimeContext, args: &CreateArgs) -> Result<()> {
    if ctx.readonly {
        bail!("cannot create issues in read-only mode");
    }

    let title = match (&args.title, &args.title_flag) {
        (Some(pos), Some(flag)) if pos != flag => {
            bail!(
                "cannot specify different titles as both positional argument and --title flag\n  \
                Positional: {:?}\n  --title:    {:?}",
                pos,
                flag
            );
        }
        (Some(t), _) => t.clone(),
        (None, Some(t)) => t.clone(),
        (None, None) => bail!("title required"),
    };

    let priority = parse_priority(&args.priority)?;
    let issue_type = IssueType::from(args.issue_type.as_str()).normalize();
    let description = args.description.as_deref().unwrap_or("").to_string();

    let store = ctx.open_store_synced().context(
        "no beads database found. Run 'bd init' to create one.",
    )?;
    let prefix = store.get_config("issue_prefix").unwrap_or_else(|_| "bd".to_string());

    let issue_id = if let Some(explicit_id) = &args.id {
        if !args.force && !explicit_id.starts_with(&format!("{prefix}-")) {
            bail!(
                "issue ID '{}' does not match configured prefix '{}' (use --force to override)",
                explicit_id,
                prefix
            );
        }
        explicit_id.clone()
    } else if let Some(parent) = &args.parent {
        idgen::check_hierarchy_depth(parent, 3)?;
        let child_number = store.next_child_number(parent)?;
        idgen::generate_child_id(parent, child_number as u64)
    } else {
        let now = Utc::now();
        let full_hash = idgen::generate_hash_id_full(&title, &description, now, &prefix);

        let mut id = String::new();
        for length in idgen::hex_defaults::MIN_LENGTH..=idgen::hex_defaults::MAX_LENGTH {
            let candidate = idgen::make_issue_id(&prefix, &full_hash, length);
            if store.get_issue(&candidate).is_err() {
                id = candidate;
                break;
            }
        }
        if id.is_empty() {
            bail!("failed to generate unique ID: all hash lengths up to {} collided", idgen::hex_defaults::MAX_LENGTH);
        }
        id
    };

    let now = Utc::now();

    let mut issue = Issue {
        id: issue_id.clone(),
        title: title.clone(),
        description: description.clone(),
        status: Status::Open,
        priority,
        issue_type,
        assignee: args.assignee.clone().unwrap_or_default(),
        created_by: ctx.actor.clone(),
        created_at: now,
        updated_at: now,
        ..Issue::default()
    };

    if args.dry_run {
        if ctx.json {
            output_json(&issue);
        } else {
            println!("[DRY RUN] Would create issue:");
            println!("  ID: {}", issue.id);
            println!("  Title: {}", issue.title);
            println!("  Type: {}", issue.issue_type);
            println!("  Priority: P{}", issue.priority);
            println!("  Status: {}", issue.status);
            if !issue.assignee.is_empty() {
                println!("  Assignee: {}", issue.assignee);
            }
            if !issue.description.is_empty() {
                println!("  Description: {}", issue.description);
            }
            if !args.labels.is_empty() {
                println!("  Labels: {}", args.labels.join(", "));
            }
        }
        return Ok(());
    }

    store
        .create_issue(&issue, &ctx.actor)
        .with_context(|| format!("failed to create issue {}", issue_id))?;

    if let Some(parent) = &args.parent {
        let parent_id = store.resolve_id(parent)?.unwrap_or_else(|| parent.clone());
        let dep = Dependency {
            issue_id: issue_id.clone(),
            depends_on_id: parent_id,
            dep_type: DependencyType::ParentChild,
            created_at: now,
            created_by: ctx.actor.clone(),
            metadata: String::new(),
            thread_id: String::new(),
        };
        if let Err(e) = store.add_dependency(&dep, &ctx.actor) {
            eprintln!("Warning: could not add parent dependency: {e}");
        }
    }

    for dep_id in &args.deps {
        let resolved = store.resolve_id(dep_id)?.unwrap_or_else(|| dep_id.clone());
        let dep = Dependency {
            issue_id: issue_id.clone(),
            depends_on_id: resolved,
            dep_type: DependencyType::Blocks,
            created_at: now,
            created_by: ctx.actor.clone(),
            metadata: String::new(),
            thread_id: String::new(),
        };
        if let Err(e) = store.add_dependency(&dep, &ctx.actor) {
            eprintln!("Warning: could not add dependency on '{dep_id}': {e}");
        }
    }

    let mut labels = Vec::new();
    for label in &args.labels {
        for l in label.split(',') {
            let l = l.trim();
            if l.is_empty() {
                continue;
            }
            store
                .add_label(&issue_id, l, &ctx.actor)
                .with_context(|| format!("failed to add label '{}' to {}", l, issue_id))?;
            labels.push(l.to_string());
        }
    }
    issue.labels = labels.clone();

    ctx.auto_flush(&store)?;

    if ctx.json {
        output_json(&issue);
    } else if args.silent {
        println!("{}", issue_id);
    } else {
        println!("Created issue: {}", issue_id);
        println!("  Title: {}", title);
        println!("  Priority: P{}", priority);
        println!("  Status: open");
    }

    Ok(())
}

/// Parse a priority string that can be either a bare number ("2") or prefixed ("P2"/"p2").
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
        bail!("priority must be between 0 and 4 (got {})", p);
    }

    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_priority_bare_number() {
        assert_eq!(parse_priority("0").unwrap(), 0);
        assert_eq!(parse_priority("2").unwrap(), 2);
        assert_eq!(parse_priority("4").unwrap(), 4);
    }

    #[test]
    fn parse_priority_prefixed() {
        assert_eq!(parse_priority("P0").unwrap(), 0);
        assert_eq!(parse_priority("P3").unwrap(), 3);
        assert_eq!(parse_priority("p1").unwrap(), 1);
    }

    #[test]
    fn parse_priority_out_of_range() {
        assert!(parse_priority("5").is_err());
        assert!(parse_priority("-1").is_err());
        assert!(parse_priority("P5").is_err());
    }

    #[test]
    fn parse_priority_invalid() {
        assert!(parse_priority("high").is_err());
        assert!(parse_priority("").is_err());
    }
}
