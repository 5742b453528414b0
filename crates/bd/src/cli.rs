//! Clap CLI definitions for the `bd` command.
//!
//! This module defines the complete CLI structure using clap 4 derive macros.

use clap::{Args, Parser, Subcommand};

/// bd -- Dependency-aware issue tracker.
///
/// Issues chained together like beads. A lightweight issue tracker
/// with first-class dependency support.
#[derive(Parser, Debug)]
#[command(
    name = "bd",
    about = "Dependency-aware issue tracker",
    long_about = "Issues chained together like beads. A lightweight issue tracker with first-class dependency support.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Database path (default: auto-discover .beads/*.db).
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Actor name for audit trail (default: $BD_ACTOR, git user.name, $USER).
    #[arg(long, global = true, env = "BD_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Sandbox mode: disable auto-sync.
    #[arg(long, global = true)]
    pub sandbox: bool,

    /// Allow operations on potentially stale data (skip staleness check).
    #[arg(long, global = true)]
    pub allow_stale: bool,

    /// Read-only mode: block write operations (for worker sandboxes).
    #[arg(long, global = true)]
    pub readonly: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new issue.
    #[command(alias = "new")]
    Create(CreateArgs),

    /// Show issue details.
    #[command(alias = "view")]
    Show(ShowArgs),

    /// List issues with filtering and formatting.
    List(ListArgs),

    /// Close one or more issues.
    Close(CloseArgs),

    /// Update issue fields.
    Update(UpdateArgs),

    /// Delete issues (destructive, requires --force).
    Delete(DeleteArgs),

    /// Reopen a closed issue.
    Reopen(ReopenArgs),

    /// Show ready work (open issues with no active blockers).
    Ready(ReadyArgs),

    /// Show issues blocked by open dependencies.
    Blocked(BlockedArgs),

    /// Dependency management (add/remove/list/cycles).
    Dep(DepArgs),

    /// Full-text search across issues.
    Search(SearchArgs),

    /// Show project statistics.
    Stats(StatsArgs),

    /// Add a comment to an issue.
    Comment(CommentArgs),

    /// List comments on an issue.
    Comments(CommentsArgs),

    /// Manage labels on an issue.
    Label(LabelArgs),

    /// Initialize a new beads workspace.
    Init(InitArgs),

    /// Manage configuration.
    Config(ConfigArgs),

    /// Reconcile the SQLite store with the shared JSONL log.
    Sync(SyncArgs),

    /// Check and repair database health.
    Doctor(DoctorArgs),

    /// Print version, build info, and platform.
    Version,

    /// Generate shell completions.
    Completion(CompletionArgs),
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Arguments for `bd create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Issue title (positional argument).
    pub title: Option<String>,

    /// Issue title (alternative to positional argument).
    #[arg(long)]
    pub title_flag: Option<String>,

    /// Issue description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Issue type (bug|feature|task|epic|chore|decision).
    #[arg(short = 't', long = "type", default_value = "task")]
    pub issue_type: String,

    /// Priority (0-4 or P0-P4).
    #[arg(short = 'p', long, default_value = "2")]
    pub priority: String,

    /// Assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Labels (comma-separated, repeatable).
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// Explicit issue ID (e.g., 'bd-42' for partitioning).
    #[arg(long)]
    pub id: Option<String>,

    /// Parent issue ID for hierarchical child.
    #[arg(long)]
    pub parent: Option<String>,

    /// Issue IDs this issue depends on (blocking, repeatable).
    #[arg(long = "deps", num_args = 1..)]
    pub deps: Vec<String>,

    /// Preview what would be created without actually creating.
    #[arg(long)]
    pub dry_run: bool,

    /// Output only the issue ID (for scripting).
    #[arg(long)]
    pub silent: bool,

    /// Force creation even if prefix doesn't match.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Show
// ---------------------------------------------------------------------------

/// Arguments for `bd show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue IDs to show.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Compact one-line output.
    #[arg(short = 's', long)]
    pub short: bool,
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Arguments for `bd list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status (or "all" to include closed).
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Include closed issues.
    #[arg(long)]
    pub all: bool,

    /// Filter by issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// Filter by assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Filter by priority.
    #[arg(short = 'p', long)]
    pub priority: Option<String>,

    /// Filter by labels (AND: must have ALL).
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// Filter by labels (OR: must have at least one).
    #[arg(long = "label-any", num_args = 1..)]
    pub label_any: Vec<String>,

    /// Sort key: priority (default), created, updated, status, id, title, type.
    #[arg(long)]
    pub sort: Option<String>,

    /// Reverse sort order.
    #[arg(long)]
    pub reverse: bool,

    /// Maximum issues to show (0 = unlimited).
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: i32,

    /// Long format (multi-line detail per issue).
    #[arg(long)]
    pub long: bool,
}

// ---------------------------------------------------------------------------
// Close
// ---------------------------------------------------------------------------

/// Arguments for `bd close`.
#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Issue IDs to close.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Reason for closing.
    #[arg(short = 'r', long)]
    pub reason: Option<String>,

    /// Force close even if pinned or blocked by open dependencies.
    #[arg(short = 'f', long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Arguments for `bd update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue ID to update.
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// New issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// New priority (0-4 or P0-P4).
    #[arg(short = 'p', long)]
    pub priority: Option<String>,

    /// New assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// New status.
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Add labels.
    #[arg(long = "add-label", num_args = 1..)]
    pub add_labels: Vec<String>,

    /// Remove labels.
    #[arg(long = "remove-label", num_args = 1..)]
    pub remove_labels: Vec<String>,
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Arguments for `bd delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Issue IDs to delete.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Force deletion without confirmation.
    #[arg(short = 'f', long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Reopen
// ---------------------------------------------------------------------------

/// Arguments for `bd reopen`.
#[derive(Args, Debug)]
pub struct ReopenArgs {
    /// Issue ID to reopen.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Ready / Blocked
// ---------------------------------------------------------------------------

/// Arguments for `bd ready`.
#[derive(Args, Debug)]
pub struct ReadyArgs {
    /// Sort policy: priority (default), hybrid, oldest.
    #[arg(short = 's', long, default_value = "priority")]
    pub sort: String,

    /// Maximum issues to show.
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: i32,

    /// Filter by assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Filter by labels (AND: must have ALL).
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// Filter by issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// Filter by priority.
    #[arg(short = 'p', long)]
    pub priority: Option<i32>,

    /// Show only unassigned issues.
    #[arg(short = 'u', long)]
    pub unassigned: bool,
}

/// Arguments for `bd blocked`.
#[derive(Args, Debug)]
pub struct BlockedArgs {
    /// Filter by assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Maximum issues to show (0 = unlimited).
    #[arg(short = 'n', long, default_value = "0")]
    pub limit: i32,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Arguments for `bd search`.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query.
    pub query: String,

    /// Filter by status.
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Filter by issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// Filter by assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Filter by labels.
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// Limit results.
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: i32,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Arguments for `bd stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    // No additional arguments beyond global --json.
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// Arguments for `bd comment` (add a comment).
#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Issue ID.
    pub id: String,
    /// Comment text (if not provided, opens editor).
    pub text: Option<String>,
}

/// Arguments for `bd comments` (list comments).
#[derive(Args, Debug)]
pub struct CommentsArgs {
    /// Issue ID.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Label (subcommands)
// ---------------------------------------------------------------------------

/// Arguments for `bd label`.
#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Issue ID.
    pub id: String,
    #[command(subcommand)]
    pub command: LabelCommands,
}

/// Label subcommands.
#[derive(Subcommand, Debug)]
pub enum LabelCommands {
    /// Add a label to an issue.
    Add(LabelAddArgs),
    /// Remove a label from an issue.
    Remove(LabelRemoveArgs),
    /// List labels on an issue.
    List,
}

/// Arguments for `bd label <id> add`.
#[derive(Args, Debug)]
pub struct LabelAddArgs {
    /// Label to add.
    pub label: String,
}

/// Arguments for `bd label <id> remove`.
#[derive(Args, Debug)]
pub struct LabelRemoveArgs {
    /// Label to remove.
    pub label: String,
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Arguments for `bd init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Issue prefix (default: current directory name).
    #[arg(short = 'p', long)]
    pub prefix: Option<String>,

    /// Suppress output.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Force re-initialization even if data already exists.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Arguments for `bd config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a configuration value.
    Set(ConfigSetArgs),
    /// Get a configuration value.
    Get(ConfigGetArgs),
    /// List all configuration values.
    List,
}

/// Arguments for `bd config set`.
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Arguments for `bd config get`.
#[derive(Args, Debug)]
pub struct ConfigGetArgs {
    /// Configuration key.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Dep
// ---------------------------------------------------------------------------

/// Arguments for `bd dep`.
#[derive(Args, Debug)]
pub struct DepArgs {
    #[command(subcommand)]
    pub command: DepCommands,
}

/// Dependency subcommands.
#[derive(Subcommand, Debug)]
pub enum DepCommands {
    /// Add a dependency between issues.
    Add(DepAddArgs),
    /// Remove a dependency between issues.
    Remove(DepRemoveArgs),
    /// List dependencies for an issue.
    List(DepListArgs),
    /// Detect dependency cycles.
    Cycles,
}

/// Arguments for `bd dep add`.
#[derive(Args, Debug)]
pub struct DepAddArgs {
    /// Source issue ID.
    pub from: String,
    /// Target issue ID.
    pub to: String,
    /// Dependency type (blocks, related, parent-child, discovered-from).
    #[arg(short = 't', long = "type", default_value = "blocks")]
    pub dep_type: String,
}

/// Arguments for `bd dep remove`.
#[derive(Args, Debug)]
pub struct DepRemoveArgs {
    /// Source issue ID.
    pub from: String,
    /// Target issue ID.
    pub to: String,
}

/// Arguments for `bd dep list`.
#[derive(Args, Debug)]
pub struct DepListArgs {
    /// Issue ID to list dependencies for.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Sync
// ---------------------------------------------------------------------------

/// Arguments for `bd sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Skip the import half; only flush dirty issues out to the JSONL log.
    #[arg(long)]
    pub flush_only: bool,
}

// ---------------------------------------------------------------------------
// Doctor
// ---------------------------------------------------------------------------

/// Arguments for `bd doctor`.
#[derive(Args, Debug)]
pub struct DoctorArgs {
    #[command(subcommand)]
    pub command: Option<DoctorCommands>,
}

/// Doctor subcommands.
#[derive(Subcommand, Debug)]
pub enum DoctorCommands {
    /// Attempt to fix detected issues.
    Fix,
    /// Check database health (default if no subcommand given).
    Health,
    /// Validate database schema and data integrity.
    Validate,
    /// Detect data pollution.
    Pollution,
    /// Check for orphaned artifacts.
    Artifacts,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Arguments for `bd completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Completion subcommands.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate Bash completions.
    Bash,
    /// Generate Zsh completions.
    Zsh,
    /// Generate Fish completions.
    Fish,
    /// Generate PowerShell completions.
    Powershell,
}
