//! Clap derive structures for the `komari` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.
//! This file is also compiled by `build.rs` for man pages, so it may only
//! depend on `clap` and `clap_complete`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// komari -- command-line client for Komari monitoring dashboards
#[derive(Debug, Parser)]
#[command(
    name = "komari",
    version,
    about = "Monitor Komari dashboard nodes from the command line",
    long_about = "A CLI for Komari server monitoring dashboards.\n\n\
        Lists nodes and their live status, charts historical load and\n\
        latency records, and produces compact widget snapshots.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Dashboard profile to use
    #[arg(long, short = 'p', env = "KOMARI_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Dashboard host, without scheme (overrides profile)
    #[arg(long, env = "KOMARI_HOST", global = true)]
    pub host: Option<String>,

    /// Connect over plain http instead of https
    #[arg(long, global = true)]
    pub http: bool,

    /// Dashboard API key
    #[arg(long, env = "KOMARI_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Username for session login (overrides profile)
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "KOMARI_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "KOMARI_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "KOMARI_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Shared value enums ───────────────────────────────────────────────

/// Node list ordering.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum SortKey {
    /// Dashboard order (weight)
    #[default]
    Index,
    Uptime,
    Cpu,
    Memory,
    Disk,
    Upload,
    Download,
}

/// History window.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Window {
    #[value(name = "1h")]
    Hour1,
    #[value(name = "4h")]
    Hours4,
    #[value(name = "6h")]
    Hours6,
    #[value(name = "12h")]
    Hours12,
    #[value(name = "1d")]
    Day1,
    #[value(name = "7d")]
    Days7,
    #[value(name = "30d")]
    Days30,
}

/// Metric charted from load records.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Metric {
    Cpu,
    Gpu,
    Memory,
    Disk,
    NetIn,
    NetOut,
    TcpConnections,
    UdpConnections,
    Processes,
}

/// Metric shown by the load widget.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum WidgetMetricArg {
    #[default]
    Cpu,
    Memory,
    Disk,
    NetIn,
    NetOut,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List and manage monitored nodes
    #[command(alias = "n")]
    Nodes(NodesArgs),

    /// Show live status of nodes
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Query historical load and latency records
    #[command(alias = "rec")]
    Records(RecordsArgs),

    /// Continuously refresh live status
    Watch(WatchArgs),

    /// One-shot widget snapshots of a single node
    Snapshot(SnapshotArgs),

    /// Verify the profile's username and password by logging in
    Login,

    /// Show the identity behind the current credentials
    Whoami,

    /// End the current session
    Logout,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Filter Arguments ──────────────────────────────────────────

/// Filtering and ordering shared by node listings.
#[derive(Debug, Args)]
pub struct NodeFilterArgs {
    /// Only nodes in this group
    #[arg(long, short = 'g')]
    pub group: Option<String>,

    /// Case-insensitive substring of the node name
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Sort key (descending unless --ascending)
    #[arg(long, default_value = "index")]
    pub sort: SortKey,

    /// Reverse the sort order
    #[arg(long)]
    pub ascending: bool,

    /// Include hidden nodes
    #[arg(long, short = 'a')]
    pub all: bool,
}

// ── Nodes ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NodesArgs {
    #[command(subcommand)]
    pub command: NodesCommand,
}

#[derive(Debug, Subcommand)]
pub enum NodesCommand {
    /// List nodes
    #[command(alias = "ls")]
    List(NodeFilterArgs),

    /// Show one node's details
    #[command(alias = "get")]
    Show {
        /// Node uuid or name
        node: String,
    },

    /// List node groups
    Groups,

    /// Edit node fields (admin)
    Edit(NodeEditArgs),

    /// Remove a node and its history (admin)
    #[command(alias = "rm")]
    Remove {
        /// Node uuid or name
        node: String,
    },

    /// Set the display order of nodes (admin)
    Reorder {
        /// Node uuids or names, first shown first
        #[arg(required = true)]
        nodes: Vec<String>,
    },
}

#[derive(Debug, Args)]
pub struct NodeEditArgs {
    /// Node uuid or name
    pub node: String,

    /// New display name
    #[arg(long)]
    pub name: Option<String>,

    /// New group
    #[arg(long)]
    pub group: Option<String>,

    /// New display weight
    #[arg(long)]
    pub weight: Option<i64>,

    /// Hide or show the node on the public page
    #[arg(long)]
    pub hidden: Option<bool>,

    /// New public remark
    #[arg(long)]
    pub remark: Option<String>,

    /// Read field changes from a JSON object file
    #[arg(long, short = 'F', conflicts_with_all = ["name", "group", "weight", "hidden", "remark"])]
    pub from_file: Option<PathBuf>,
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Show one node's full status instead of the table
    pub node: Option<String>,

    #[command(flatten)]
    pub filter: NodeFilterArgs,
}

// ── Records ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RecordsArgs {
    #[command(subcommand)]
    pub command: RecordsCommand,
}

#[derive(Debug, Subcommand)]
pub enum RecordsCommand {
    /// Load metric history of one node
    Load {
        /// Node uuid or name
        node: String,

        /// History window
        #[arg(long, short = 'w', default_value = "4h")]
        window: Window,

        /// Metric to chart
        #[arg(long, short = 'm', default_value = "cpu")]
        metric: Metric,

        /// Print the raw records instead of the downsampled series
        #[arg(long)]
        raw: bool,

        /// Stride-sample to at most N points instead of time-bucket averaging
        #[arg(long, conflicts_with = "raw")]
        points: Option<usize>,
    },

    /// Latency history of one node, per probe task
    Ping {
        /// Node uuid or name
        node: String,

        /// History window
        #[arg(long, short = 'w', default_value = "1h")]
        window: Window,

        /// Print the raw samples instead of the downsampled series
        #[arg(long)]
        raw: bool,

        /// Stride-sample each task to at most N points instead of averaging
        #[arg(long, conflicts_with = "raw")]
        points: Option<usize>,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Poll period, e.g. "5s" or "1m" (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<String>,

    /// Stop after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<u32>,

    #[command(flatten)]
    pub filter: NodeFilterArgs,
}

// ── Snapshot ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    #[command(subcommand)]
    pub command: SnapshotCommand,
}

#[derive(Debug, Subcommand)]
pub enum SnapshotCommand {
    /// Status of one node
    Status {
        /// Node uuid or name (default: lowest-weight node)
        #[arg(long)]
        node: Option<String>,
    },

    /// Recent load chart of one node
    Load {
        /// Node uuid or name (default: lowest-weight node)
        #[arg(long)]
        node: Option<String>,

        /// Metric to chart
        #[arg(long, short = 'm', default_value = "cpu")]
        metric: WidgetMetricArg,
    },

    /// Recent per-task latency of one node
    Ping {
        /// Node uuid or name (default: lowest-weight node)
        #[arg(long)]
        node: Option<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (e.g., "host", "ssl", "username", "poll_interval")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password or API key in the system keyring
    ///
    /// Uses the profile selected by --profile, else the default one.
    SetPassword {
        /// Store the API key instead of the password
        #[arg(long)]
        key: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
