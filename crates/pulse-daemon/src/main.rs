use clap::Parser;
use pulse_daemon::cli::{
    bootstrap_logging, handle_config, init_logging, list_nodes, resolve_paths, run_checks, run_daemon,
    run_sync_once, show_snapshots, show_status, show_version, Cli, Commands,
};
use pulse_types::PulseResult;

#[tokio::main]
async fn main() -> PulseResult<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let (_, config_path) = resolve_paths(&cli);
    let data_dir = cli.data_dir.as_deref();
    let format = cli.format;

    // A broken config file is reported by the command itself.
    let logging = bootstrap_logging(&config_path, |key| std::env::var(key).ok());
    init_logging(&cli, &logging)?;

    match cli.command {
        Commands::Run => run_daemon(&config_path, data_dir).await?,
        Commands::Sync => run_sync_once(&config_path, data_dir, format).await?,
        Commands::Check => run_checks(&config_path, data_dir, format).await?,
        Commands::Status { url } => show_status(&config_path, data_dir, url, format).await?,
        Commands::Nodes { limit, online } => {
            list_nodes(&config_path, data_dir, limit, online, format).await?
        }
        Commands::Snapshots { count } => show_snapshots(&config_path, data_dir, count, format).await?,
        Commands::Config { action } => handle_config(&config_path, data_dir, action, format)?,
        Commands::Version => show_version(format)?,
    }

    Ok(())
}
