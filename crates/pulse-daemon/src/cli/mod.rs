//! Command-line surface of the `pulse` binary.

mod commands;
mod config_cmd;
mod info;
mod run;
mod status;
mod store_cmd;
mod sync_cmd;
mod utils;

pub use commands::{Cli, Commands, ConfigAction, OutputFormat};
pub use config_cmd::handle_config;
pub use info::show_version;
pub use run::{run_daemon, wait_for_shutdown, Pipeline};
pub use status::{default_status_url, fetch_status, show_status, RemoteSchedulerStatus};
pub use store_cmd::{list_nodes, select_nodes, show_snapshots};
pub use sync_cmd::{run_checks, run_sync_once};
pub use utils::{bootstrap_logging, init_logging, load_config, log_directive, resolve_paths};
