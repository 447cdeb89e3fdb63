use super::commands::OutputFormat;
use super::utils::print_json;
use pulse_types::{PulseResult, OFFLINE_THRESHOLD_SECS, ONLINE_THRESHOLD_SECS};

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");
const BUILD_NAME: &str = env!("CARGO_PKG_NAME");

pub fn show_version(format: OutputFormat) -> PulseResult<()> {
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "name": BUILD_NAME,
            "version": BUILD_VERSION,
            "os": std::env::consts::OS,
            "arch": std::env::consts::ARCH,
        })),
        OutputFormat::Text => {
            println!("pulse {}", BUILD_VERSION);
            println!("  target:    {}-{}", std::env::consts::ARCH, std::env::consts::OS);
            println!(
                "  liveness:  online < {}s, offline >= {}s",
                ONLINE_THRESHOLD_SECS, OFFLINE_THRESHOLD_SECS
            );
            Ok(())
        }
    }
}
