//! CLI argument definitions for raidplan.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use raidplan_core::NodeScope;
use raidplan_model::{MapId, NodeId, StationId};

#[derive(Parser)]
#[command(
    name = "raidplan",
    version,
    about = "Quest, hideout and map marker tracker",
    long_about = "Track quest and hideout progress against a game-data catalog.\n\n\
                  Progress is saved after every change. Node ids are written as\n\
                  quest:<id> or level:<id>."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate a catalog and print its size and fingerprint.
    Check(CatalogArgs),

    /// Show node statuses in dependency order.
    Status(StatusArgs),

    /// Mark a quest or hideout level as completed.
    Complete(NodeArgs),

    /// Mark a node as not completed, along with everything that depends on it.
    Undo(NodeArgs),

    /// Set a hideout station to a level.
    Station(StationArgs),

    /// List the items still needed.
    Needs(NeedsArgs),

    /// List the markers to show on a map.
    Markers(MarkersArgs),
}

#[derive(Args)]
pub struct CatalogArgs {
    /// Normalized catalog JSON.
    #[arg(long = "catalog", value_name = "PATH", default_value = "catalog.json")]
    pub catalog: PathBuf,

    /// Tracker options (TOML).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct SessionArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Progress file, created on first change.
    #[arg(long = "progress", value_name = "PATH", default_value = "progress.json")]
    pub progress: PathBuf,
}

#[derive(Args)]
pub struct StatusArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Include locked nodes.
    #[arg(long = "locked")]
    pub locked: bool,
}

#[derive(Args)]
pub struct NodeArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Node id, e.g. quest:debut or level:stash-2.
    #[arg(value_name = "NODE")]
    pub node: NodeId,
}

#[derive(Args)]
pub struct StationArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    #[arg(value_name = "STATION")]
    pub station: StationId,

    /// Target level; 0 removes every level.
    #[arg(value_name = "LEVEL")]
    pub level: u32,
}

#[derive(Args)]
pub struct NeedsArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Also plan for locked nodes unlocking within N completion waves.
    #[arg(long = "look-ahead", value_name = "N")]
    pub look_ahead: Option<u32>,

    /// Restrict to quests or hideout levels.
    #[arg(long = "scope", value_enum)]
    pub scope: Option<ScopeArg>,

    /// CSV with item_id,quantity columns of items already owned.
    #[arg(long = "owned", value_name = "CSV")]
    pub owned: Option<PathBuf>,
}

#[derive(Args)]
pub struct MarkersArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    #[arg(value_name = "MAP")]
    pub map: MapId,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ScopeArg {
    All,
    Quests,
    Hideout,
}

impl From<ScopeArg> for NodeScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::All => Self::All,
            ScopeArg::Quests => Self::Quests,
            ScopeArg::Hideout => Self::Hideout,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
