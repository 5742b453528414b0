//! `bd dep` -- dependency management (add/remove/list/cycles).

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Context, Result};
use chrono::Utc;

use beads_core::dependency::Dependency;
use beads_core::enums::DependencyType;

use crate::cli::{DepArgs, DepCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Blocking-style dependency types that participate in cycle detection.
const BLOCKING_TYPES: &[&str] = &["blocks", "parent-child", "conditional-blocks", "waits-for"];

/// Execute the `bd dep` command.
pub fn run(ctx: &RuntimeContext, args: &DepArgs) -> Result<()> {
    let store = ctx
        .open_store_synced()
        .context("no beads database found. Run 'bd init' to create one.")?;

    match &args.command {
        DepCommands::Add(add_args) => {
            if ctx.readonly {
                bail!("cannot add dependencies in read-only mode");
            }
            let dep_type = DependencyType::from(add_args.dep_type.as_str());
            if !dep_type.is_valid() {
                bail!(
                    "invalid dependency type '{}' (valid: blocks, related, parent-child, discovered-from)",
                    add_args.dep_type
                );
            }
            store.get_issue(&add_args.from)?;
            store.get_issue(&add_args.to)?;

            let dep = Dependency {
                issue_id: add_args.from.clone(),
                depends_on_id: add_args.to.clone(),
                dep_type: dep_type.clone(),
                created_at: Utc::now(),
                created_by: ctx.actor.clone(),
                metadata: String::new(),
                thread_id: String::new(),
            };
            store.add_dependency(&dep, &ctx.actor)?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "from": add_args.from,
                    "to": add_args.to,
                    "type": dep_type.as_str(),
                }));
            } else if !ctx.quiet {
                println!(
                    "Added dependency: {} --[{}]--> {}",
                    add_args.from, dep_type, add_args.to
                );
            }
        }

        DepCommands::Remove(remove_args) => {
            if ctx.readonly {
                bail!("cannot remove dependencies in read-only mode");
            }
            store.remove_dependency(&remove_args.from, &remove_args.to, &ctx.actor)?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "from": remove_args.from,
                    "to": remove_args.to,
                }));
            } else if !ctx.quiet {
                println!(
                    "Removed dependency: {} -> {}",
                    remove_args.from, remove_args.to
                );
            }
        }

        DepCommands::List(list_args) => {
            let deps = store.get_dependencies_with_metadata(&list_args.id)?;
            let dependents = store.get_dependents_with_metadata(&list_args.id)?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "issue_id": list_args.id,
                    "depends_on": deps.iter().map(dep_json).collect::<Vec<_>>(),
                    "depended_on_by": dependents.iter().map(dep_json).collect::<Vec<_>>(),
                }));
            } else if deps.is_empty() && dependents.is_empty() {
                println!("No dependencies for {}", list_args.id);
            } else {
                if !deps.is_empty() {
                    println!("Depends on:");
                    for d in &deps {
                        println!(
                            "  [{}] {} {} ({})",
                            d.dependency.dep_type, d.issue.id, d.issue.title, d.issue.status
                        );
                    }
                }
                if !dependents.is_empty() {
                    if !deps.is_empty() {
                        println!();
                    }
                    println!("Depended on by:");
                    for d in &dependents {
                        println!(
                            "  [{}] {} {} ({})",
                            d.dependency.dep_type, d.issue.id, d.issue.title, d.issue.status
                        );
                    }
                }
            }
        }

        DepCommands::Cycles => {
            let cycles = detect_all_cycles(&store)?;
            if ctx.json {
                output_json(&cycles);
            } else if cycles.is_empty() {
                println!("No dependency cycles detected");
            } else {
                println!("Found {} dependency cycle(s):\n", cycles.len());
                for (i, cycle) in cycles.iter().enumerate() {
                    print!("{}. ", i + 1);
                    for (j, id) in cycle.iter().enumerate() {
                        if j > 0 {
                            print!(" -> ");
                        }
                        print!("{}", id);
                    }
                    if let Some(first) = cycle.first() {
                        print!(" -> {}", first);
                    }
                    println!();
                }
            }
        }
    }

    ctx.auto_flush(&store)?;
    Ok(())
}

fn dep_json(d: &beads_storage::IssueWithDependencyMetadata) -> serde_json::Value {
    serde_json::json!({
        "id": d.issue.id,
        "type": d.dependency.dep_type.as_str(),
        "title": d.issue.title,
        "status": d.issue.status.as_str(),
    })
}

/// Walks every issue's outgoing blocking-type edges to find cycles via DFS.
fn detect_all_cycles(store: &dyn beads_storage::Storage) -> Result<Vec<Vec<String>>> {
    let all = store.search_issues("", &beads_core::filter::IssueFilter::default())?;

    let mut graph: HashMap<String, Vec<String>> = HashMap::new();
    for issue in &all {
        let edges = store.get_dependencies_with_metadata(&issue.id)?;
        let targets = edges
            .into_iter()
            .filter(|d| BLOCKING_TYPES.contains(&d.dependency.dep_type.as_str()))
            .map(|d| d.issue.id)
            .collect();
        graph.insert(issue.id.clone(), targets);
    }

    let mut cycles: Vec<Vec<String>> = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut rec_stack: HashSet<String> = HashSet::new();
    let mut path: Vec<String> = Vec::new();

    let nodes: Vec<String> = graph.keys().cloned().collect();
    for node in &nodes {
        if !visited.contains(node) {
            dfs_cycles(node, &graph, &mut visited, &mut rec_stack, &mut path, &mut cycles);
        }
    }
    Ok(cycles)
}

fn dfs_cycles(
    node: &str,
    graph: &HashMap<String, Vec<String>>,
    visited: &mut HashSet<String>,
    rec_stack: &mut HashSet<String>,
    path: &mut Vec<String>,
    cycles: &mut Vec<Vec<String>>,
) {
    visited.insert(node.to_string());
    rec_stack.insert(node.to_string());
    path.push(node.to_string());

    if let Some(neighbors) = graph.get(node) {
        for neighbor in neighbors {
            if !visited.contains(neighbor.as_str()) {
                dfs_cycles(neighbor, graph, visited, rec_stack, path, cycles);
            } else if rec_stack.contains(neighbor.as_str()) {
                if let Some(start) = path.iter().position(|n| n == neighbor) {
                    cycles.push(path[start..].to_vec());
                }
            }
        }
    }

    path.pop();
    rec_stack.remove(node);
}
