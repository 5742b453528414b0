//! `bd` -- dependency-aware issue tracker CLI.
//!
//! This is the entry point for the beads Rust port. It parses CLI arguments
//! with clap, resolves the runtime context, and dispatches to command handlers.

mod cli;
mod commands;
mod context;
mod output;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Tracks whether a Ctrl+C has already been received.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

fn main() {
    // Install signal handlers for graceful shutdown.
    // First Ctrl+C: exit cleanly. Second: force exit.
    let _ = ctrlc::set_handler(|| {
        if CTRLC_RECEIVED.swap(true, Ordering::SeqCst) {
            // Second signal: force exit
            std::process::exit(1);
        }
        // First signal: exit cleanly
        std::process::exit(0);
    });

    // Parse CLI arguments
    let cli = Cli::parse();

    // Build runtime context from global args
    let ctx = RuntimeContext::from_global_args(&cli.global);

    // Set up logging based on verbosity
    if ctx.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("bd=debug")
            .with_writer(std::io::stderr)
            .init();
    }

    // Dispatch to command handler
    let result = match cli.command {
        Some(Commands::Create(args)) => commands::create::run(&ctx, &args),
        Some(Commands::Show(args)) => commands::show::run(&ctx, &args),
        Some(Commands::List(args)) => commands::list::run(&ctx, &args),
        Some(Commands::Close(args)) => commands::close::run(&ctx, &args),
        Some(Commands::Update(args)) => commands::update::run(&ctx, &args),
        Some(Commands::Delete(args)) => commands::delete::run(&ctx, &args),
        Some(Commands::Reopen(args)) => commands::reopen::run(&ctx, &args),
        Some(Commands::Ready(args)) => commands::ready::run(&ctx, &args),
        Some(Commands::Blocked(args)) => commands::blocked::run(&ctx, &args),
        Some(Commands::Dep(args)) => commands::dep::run(&ctx, &args),
        Some(Commands::Search(args)) => commands::search::run(&ctx, &args),
        Some(Commands::Stats(args)) => commands::stats::run(&ctx, &args),
        Some(Commands::Comment(args)) => commands::comment::run_add(&ctx, &args),
        Some(Commands::Comments(args)) => commands::comment::run_list(&ctx, &args),
        Some(Commands::Label(args)) => commands::label::run(&ctx, &args),
        Some(Commands::Init(args)) => commands::init::run(&ctx, &args),
        Some(Commands::Config(args)) => commands::config_cmd::run(&ctx, &args),
        Some(Commands::Sync(args)) => commands::sync_cmd::run(&ctx, &args),
        Some(Commands::Doctor(args)) => commands::doctor::run(&ctx, &args),
        Some(Commands::Version) => commands::version::run(&ctx),
        Some(Commands::Completion(args)) => commands::completion::run(&ctx, &args),
        None => {
            // No subcommand -- print help
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    // Handle errors: print message and exit with code 1
    if let Err(e) = result {
        // For JSON mode, output error as JSON
        if cli.global.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}
