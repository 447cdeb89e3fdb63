use super::commands::{ConfigAction, OutputFormat};
use super::utils::{dim, load_config, print_fail, print_json, print_ok};
use pulse_types::{PulseError, PulseResult};
use std::path::Path;

pub fn handle_config(
    config_path: &Path,
    data_dir: Option<&Path>,
    action: Option<ConfigAction>,
    format: OutputFormat,
) -> PulseResult<()> {
    let config = load_config(config_path, data_dir)?;

    match action {
        Some(ConfigAction::Show) | None => {
            if !config_path.exists() {
                println!("{}", dim(format!("No configuration file at {:?}, showing defaults", config_path)));
            }
            match format {
                OutputFormat::Text => print!("{}", config.redacted()),
                OutputFormat::Json => print_json(&serde_json::json!({
                    "config_path": config_path,
                    "valid": config.validate().is_ok(),
                    "endpoints": config.redacted().endpoints,
                    "sync_interval_secs": config.sync.interval_secs,
                    "api_addr": config.api_socket_addr(),
                    "storage_path": config.storage_path(),
                }))?,
            }
        }
        Some(ConfigAction::Validate) => match config.validate() {
            Ok(()) => print_ok(format!("Configuration is valid ({:?})", config_path)),
            Err(e) => {
                print_fail(format!("Configuration error: {}", e));
                return Err(e);
            }
        },
        Some(ConfigAction::Init { force }) => {
            if config_path.exists() && !force {
                return Err(PulseError::Config(format!(
                    "{:?} already exists (use --force to overwrite)",
                    config_path
                )));
            }
            config.save(config_path)?;
            print_ok(format!("Wrote configuration to {:?}", config_path));
            if config.validate().is_err() {
                println!("{}", dim("Set rpc.endpoints (or PRPC_ENDPOINTS) before running the daemon"));
            }
        }
    }
    Ok(())
}
