//! Clap derive structures for the `neoblue` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// neoblue -- inspect and drive NeoSmart Blue motorized blinds
#[derive(Debug, Parser)]
#[command(
    name = "neoblue",
    version,
    about = "Decode and drive NeoSmart Blue blinds from the command line",
    long_about = "Tools for NeoSmart Blue Bluetooth LE blinds.\n\n\
        Decodes status advertisements into the coordinator's state record,\n\
        manages the configured device list, and rehearses commands against\n\
        a simulated radio to show the connect/write/disconnect sequence.",
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
    /// Config file to use instead of the platform default
    #[arg(long, env = "NEOBLUE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NEOBLUE_OUTPUT",
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
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Decode a status payload into the full device record
    #[command(alias = "dec")]
    Decode(PayloadArgs),

    /// Show the cover reading a status payload produces
    Cover(PayloadArgs),

    /// List configured blinds
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Rehearse a command against a simulated radio
    #[command(alias = "sim")]
    Simulate(SimulateArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Payload ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PayloadArgs {
    /// Manufacturer data as hex, e.g. "55320A4B21" or "55:32:0a:4b:21"
    pub payload: String,

    /// Signal strength to attach to the observation, in dBm
    #[arg(long, allow_hyphen_values = true)]
    pub rssi: Option<i16>,
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List configured blinds with their effective timeouts
    #[command(alias = "ls")]
    List,

    /// Show one configured blind
    Get {
        /// Device name from the config file
        name: String,
    },
}

// ── Simulate ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// Configured device name or a raw address
    pub device: String,

    #[command(subcommand)]
    pub action: CoverAction,

    /// Status payload (hex) the blind advertises before the command
    #[arg(long)]
    pub payload: Option<String>,

    /// Advertise as non-connectable
    #[arg(long, conflicts_with = "absent")]
    pub non_connectable: bool,

    /// Pretend the blind is out of range
    #[arg(long)]
    pub absent: bool,

    /// Make the simulated write fail with this reason
    #[arg(long)]
    pub fail_write: Option<String>,
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum CoverAction {
    /// Fully open the blind
    Open,
    /// Fully close the blind
    Close,
    /// Stop any movement
    Stop,
    /// Move to a position (0 = closed, 100 = open)
    #[command(alias = "pos")]
    Position {
        /// Target position, 0-100
        value: u16,
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
    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,

    /// Add or replace a blind
    AddDevice {
        /// Name to refer to the blind by
        name: String,

        /// Bluetooth address, e.g. C4:BE:84:00:11:22
        address: String,

        /// Human-readable label
        #[arg(long)]
        label: Option<String>,

        /// Connect timeout override in seconds
        #[arg(long)]
        connect_timeout: Option<u64>,

        /// Command timeout override in seconds
        #[arg(long)]
        command_timeout: Option<u64>,
    },

    /// Remove a blind
    #[command(alias = "rm")]
    RemoveDevice {
        /// Device name to remove
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
