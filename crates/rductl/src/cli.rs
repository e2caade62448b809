//! Clap derive structures for the `rductl` CLI.
//!
//! Also compiled into `build.rs` for man page generation, so this module
//! may only depend on clap and clap_complete.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// rductl -- batch provisioning for cable modems and MTAs
#[derive(Debug, Parser)]
#[command(
    name = "rductl",
    version,
    about = "Bulk export, import and reset of devices on a BAC provisioning server",
    long_about = "Talks to a BAC Regional Distribution Unit through its batch gateway.\n\n\
        Every change is submitted as a batch and its status is checked before\n\
        anything is reported as done.",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "RDUCTL_PROFILE", global = true)]
    pub profile: Option<String>,

    /// RDU host name or address (overrides profile)
    #[arg(long, short = 'H', env = "RDUCTL_HOST", global = true)]
    pub host: Option<String>,

    /// Batch gateway port [default: 49187]
    #[arg(long, env = "RDUCTL_PORT", global = true)]
    pub port: Option<u16>,

    /// Gateway URL scheme [default: https]
    #[arg(long, env = "RDUCTL_SCHEME", global = true)]
    pub scheme: Option<Scheme>,

    /// RDU user name
    #[arg(long, short = 'u', env = "RDUCTL_USERNAME", global = true)]
    pub username: Option<String>,

    /// RDU password
    #[arg(long, env = "RDUCTL_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format [default: table]
    #[arg(long, short = 'o', env = "RDUCTL_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

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
    #[arg(long, short = 'k', env = "RDUCTL_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: 30]
    #[arg(long, env = "RDUCTL_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Shared Enums ─────────────────────────────────────────────────────

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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scheme {
    Http,
    Https,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceKind {
    /// DOCSIS cable modems
    Docsis,
    /// PacketCable MTAs
    #[value(alias = "pktcbl")]
    Mta,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export every device of one type to a pipe-delimited file
    Export(ExportArgs),

    /// Add DOCSIS devices from a pipe-delimited file
    Import(ImportArgs),

    /// Reset a single device
    Reset(DeviceArgs),

    /// Show the provisioning record of a single device
    Show(DeviceArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Device class to export
    #[arg(long, short = 't', default_value = "docsis")]
    pub device_type: DeviceKind,

    /// Output file, truncated first [default: docsis_export.txt or pktcbl_export.txt]
    #[arg(long, short = 'f')]
    pub file: Option<PathBuf>,

    /// Devices per search page [default: from config, 100]
    #[arg(long)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Input file with `ownerID|macAddress|classOfService` lines, or `-` for stdin
    pub file: PathBuf,

    /// Split the records into batches of at most this many devices
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Provisioning label applied to every imported device
    #[arg(long)]
    pub dhcp_criteria: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeviceArgs {
    /// Device MAC address
    pub mac: String,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Display current configuration (passwords redacted)
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (host, port, scheme, username, password_env, ca_cert, insecure, timeout)
        key: String,
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a profile password in the system keyring
    SetPassword {
        /// Profile to update [default: active profile]
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
