use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "pulse")]
#[command(version = BUILD_VERSION)]
#[command(about = "Pulse Daemon - Storage node fleet synchronization")]
#[command(long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(short, long, global = true, value_name = "FILE", help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[arg(short = 'd', long, global = true, value_name = "DIR", env = "PULSE_DATA_DIR", help = "Data directory path")]
    pub data_dir: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase verbosity (-v, -vv, -vvv)")]
    pub verbose: u8,

    #[arg(short, long, global = true, help = "Suppress non-error output")]
    pub quiet: bool,

    #[arg(long, global = true, value_name = "FILE", help = "Write logs to file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = "text", help = "Output format")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Start the daemon")]
    #[command(long_about = "Start the sync daemon.\n\nRuns a sync cycle immediately, then on the configured interval, and serves the operational HTTP API until SIGINT or SIGTERM.")]
    Run,

    #[command(about = "Run one sync cycle and exit")]
    Sync,

    #[command(about = "Check fleet RPC and store reachability")]
    Check,

    #[command(about = "Query a running daemon's sync status")]
    Status {
        #[arg(long, value_name = "URL", help = "Daemon API base URL (defaults to the configured bind address)")]
        url: Option<String>,
    },

    #[command(about = "List stored nodes")]
    Nodes {
        #[arg(short = 'n', long, default_value = "50", help = "Maximum nodes to show")]
        limit: usize,
        #[arg(long, help = "Only show online nodes")]
        online: bool,
    },

    #[command(about = "Show the latest network snapshots")]
    Snapshots {
        #[arg(short = 'n', long, default_value = "10", help = "Number of snapshots to show")]
        count: usize,
    },

    #[command(about = "Manage configuration")]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    #[command(about = "Show version information")]
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    #[command(about = "Show the effective configuration")]
    Show,
    #[command(about = "Validate the configuration")]
    Validate,
    #[command(about = "Write the effective configuration to the config file")]
    Init {
        #[arg(short, long, help = "Overwrite an existing file")]
        force: bool,
    },
}
