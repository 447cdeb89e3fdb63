use pulse_types::{PulseError, PulseResult};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::api::ApiConfig;
use super::credits::CreditsConfig;
use super::logging::LoggingConfig;
use super::rpc::RpcConfig;
use super::storage::StorageSection;
use super::sync::SyncConfig;
use super::types::LogLevel;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub rpc: RpcConfig,
    pub credits: CreditsConfig,
    pub sync: SyncConfig,
    pub api: ApiConfig,
    pub storage: StorageSection,
    pub logging: LoggingConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".pulse"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/pulse"));

        Self {
            data_dir,
            rpc: RpcConfig::default(),
            credits: CreditsConfig::default(),
            sync: SyncConfig::default(),
            api: ApiConfig::default(),
            storage: StorageSection::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DaemonConfig {
    pub fn load(path: impl AsRef<Path>) -> PulseResult<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read the file without environment overrides or validation.
    pub fn load_file(path: impl AsRef<Path>) -> PulseResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| PulseError::Config(format!("Failed to read config: {}", e)))?;

        toml::from_str(&contents)
            .map_err(|e| PulseError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> PulseResult<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| PulseError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PulseError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path.as_ref(), contents)
            .map_err(|e| PulseError::Config(format!("Failed to write config: {}", e)))?;

        info!("Configuration saved to {:?}", path.as_ref());
        Ok(())
    }

    /// Apply overrides from a variable lookup, normally the process
    /// environment. Unparseable numeric values are ignored with a warning.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("PULSE_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(list) = lookup("PRPC_ENDPOINTS") {
            let endpoints = RpcConfig::parse_endpoints(&list);
            if !endpoints.is_empty() {
                self.rpc.endpoints = endpoints;
            }
        }

        if let Some(ms) = parse_var(&lookup, "API_TIMEOUT_MS") {
            self.rpc.timeout_ms = ms;
        }

        if let Some(n) = parse_var(&lookup, "MAX_RETRIES") {
            self.rpc.max_retries = n;
        }

        if let Some(ms) = parse_var(&lookup, "RETRY_BASE_DELAY_MS") {
            self.rpc.retry_base_delay_ms = ms;
        }

        if let Some(secs) = parse_var(&lookup, "SYNC_INTERVAL_SECONDS") {
            self.sync.interval_secs = secs;
        }

        if let Some(url) = lookup("CREDITS_API_URL") {
            self.credits.url = url;
        }

        if let Some(port) = parse_var(&lookup, "PORT") {
            self.api.port = port;
        }

        if let Some(bind) = lookup("PULSE_API_BIND") {
            match bind.parse() {
                Ok(addr) => self.api.bind_address = addr,
                Err(_) => warn!("Ignoring invalid PULSE_API_BIND value: {}", bind),
            }
        }

        self.logging.apply_overrides(&lookup);
    }

    pub fn validate(&self) -> PulseResult<()> {
        if self.rpc.endpoints.is_empty() {
            return Err(PulseError::Config(
                "PRPC_ENDPOINTS is required (comma-separated list)".into(),
            ));
        }

        for endpoint in &self.rpc.endpoints {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(PulseError::Config(format!(
                    "Invalid RPC endpoint (expected http:// or https://): {}",
                    endpoint
                )));
            }
        }

        if self.rpc.timeout_ms == 0 {
            return Err(PulseError::Config("RPC timeout cannot be 0".into()));
        }

        for (name, method) in self.rpc.methods.all() {
            if method.trim().is_empty() {
                return Err(PulseError::Config(format!(
                    "RPC method name for '{}' cannot be empty",
                    name
                )));
            }
        }

        if self.sync.interval_secs == 0 {
            return Err(PulseError::Config("Sync interval cannot be 0".into()));
        }

        if self.credits.url.trim().is_empty() {
            return Err(PulseError::Config("Credits API URL cannot be empty".into()));
        }

        if self.api.enabled && self.api.port == 0 {
            return Err(PulseError::Config("API port cannot be 0".into()));
        }

        if self.rpc.max_retries > 10 {
            warn!(
                "max_retries = {} with linear backoff may hold a sync cycle for a long time",
                self.rpc.max_retries
            );
        }

        Ok(())
    }

    pub fn storage_path(&self) -> PathBuf {
        if self.storage.path.is_absolute() {
            self.storage.path.clone()
        } else {
            self.data_dir.join(&self.storage.path)
        }
    }

    pub fn api_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.api.bind_address, self.api.port)
    }

    pub fn redacted(&self) -> RedactedConfig {
        RedactedConfig {
            data_dir: self.data_dir.clone(),
            endpoints: self.rpc.endpoints.iter().map(|e| redact_url(e)).collect(),
            timeout_ms: self.rpc.timeout_ms,
            max_retries: self.rpc.max_retries,
            sync_interval_secs: self.sync.interval_secs,
            credits_url: redact_url(&self.credits.url),
            api_enabled: self.api.enabled,
            api_addr: self.api_socket_addr(),
            storage_path: self.storage_path(),
            log_level: self.logging.level,
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {} value: {}", key, raw);
            None
        }
    }
}

/// Keep scheme and host, drop path and query (which may carry API keys).
fn redact_url(url: &str) -> String {
    match url.split_once("://") {
        Some((scheme, rest)) => {
            let host = rest.split(['/', '?']).next().unwrap_or(rest);
            format!("{}://{}", scheme, host)
        }
        None => url.to_string(),
    }
}

#[derive(Debug)]
pub struct RedactedConfig {
    pub data_dir: PathBuf,
    pub endpoints: Vec<String>,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub sync_interval_secs: u64,
    pub credits_url: String,
    pub api_enabled: bool,
    pub api_addr: SocketAddr,
    pub storage_path: PathBuf,
    pub log_level: LogLevel,
}

impl std::fmt::Display for RedactedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Pulse Daemon Configuration")?;
        writeln!(f, "==========================")?;
        writeln!(f, "Data dir: {:?}", self.data_dir)?;
        writeln!(f, "RPC endpoints ({}):", self.endpoints.len())?;
        for endpoint in &self.endpoints {
            writeln!(f, "  {}", endpoint)?;
        }
        writeln!(f, "RPC timeout: {}ms, max retries: {}", self.timeout_ms, self.max_retries)?;
        writeln!(f, "Sync interval: {}s", self.sync_interval_secs)?;
        writeln!(f, "Credits feed: {}", self.credits_url)?;
        writeln!(
            f,
            "API: {} ({})",
            self.api_addr,
            if self.api_enabled { "ON" } else { "OFF" }
        )?;
        writeln!(f, "Storage: {:?}", self.storage_path)?;
        writeln!(f, "Log level: {}", self.log_level)?;
        Ok(())
    }
}
