//! `bd config` -- manage configuration (set/get/list).

use anyhow::{bail, Context, Result};

use crate::cli::{ConfigArgs, ConfigCommands};
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Execute the `bd config` command.
pub fn run(ctx: &RuntimeContext, args: &ConfigArgs) -> Result<()> {
    let store = ctx
        .open_store()
        .context("no beads database found. Run 'bd init' to create one.")?;

    match &args.command {
        ConfigCommands::Set(set_args) => {
            if ctx.readonly {
                bail!("cannot set config in read-only mode");
            }
            store
                .set_config(&set_args.key, &set_args.value)
                .with_context(|| format!("failed to set config key '{}'", set_args.key))?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "key": set_args.key,
                    "value": set_args.value,
                }));
            } else if !ctx.quiet {
                println!("Set {} = {}", set_args.key, set_args.value);
            }
        }

        ConfigCommands::Get(get_args) => {
            let value = store.get_config(&get_args.key).ok();
            if ctx.json {
                output_json(&serde_json::json!({
                    "key": get_args.key,
                    "value": value,
                }));
            } else {
                match value {
                    Some(v) => println!("{}", v),
                    None => {
                        eprintln!("Key '{}' not found", get_args.key);
                        std::process::exit(1);
                    }
                }
            }
        }

        ConfigCommands::List => {
            let entries = store.get_all_config()?;
            if ctx.json {
                let map: serde_json::Map<String, serde_json::Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                output_json(&map);
            } else if entries.is_empty() {
                println!("No configuration values set");
            } else {
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                for key in keys {
                    println!("{} = {}", key, entries[key]);
                }
            }
        }
    }

    Ok(())
}
