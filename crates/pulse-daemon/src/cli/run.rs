use super::utils::{load_config, print_ok};
use crate::api::{self, ApiState};
use crate::config::DaemonConfig;
use crate::fleet::{FleetReader, HttpCreditsFeed};
use crate::rpc::EndpointGateway;
use crate::scheduler::Scheduler;
use crate::storage::SledFleetStore;
use crate::sync::SyncOrchestrator;
use pulse_types::{PulseError, PulseResult};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

const BUILD_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Everything a sync cycle needs, wired from one configuration.
pub struct Pipeline {
    pub store: Arc<SledFleetStore>,
    pub gateway: Arc<EndpointGateway>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub scheduler: Arc<Scheduler>,
}

impl Pipeline {
    pub fn build(config: &DaemonConfig) -> PulseResult<Self> {
        config.validate()?;

        if !config.data_dir.exists() {
            std::fs::create_dir_all(&config.data_dir)
                .map_err(|e| PulseError::Storage(format!("Failed to create data dir: {}", e)))?;
        }

        let store = Arc::new(SledFleetStore::open(config.storage_path(), &config.storage)?);
        Self::with_store(config, store)
    }

    pub fn with_store(config: &DaemonConfig, store: Arc<SledFleetStore>) -> PulseResult<Self> {
        let gateway = Arc::new(EndpointGateway::from_config(&config.rpc)?);
        let credits = Arc::new(HttpCreditsFeed::from_config(&config.credits)?);
        let reader = Arc::new(FleetReader::new(
            gateway.clone(),
            credits,
            config.rpc.methods.clone(),
        ));
        let orchestrator = Arc::new(SyncOrchestrator::new(reader, store.clone()));
        let scheduler = Arc::new(Scheduler::new(orchestrator.clone(), config.sync.interval_secs));

        Ok(Self {
            store,
            gateway,
            orchestrator,
            scheduler,
        })
    }
}

pub async fn run_daemon(config_path: &Path, data_dir: Option<&Path>) -> PulseResult<()> {
    let config = load_config(config_path, data_dir)?;
    info!("Starting Pulse daemon v{}", BUILD_VERSION);
    info!(
        endpoints = config.rpc.endpoints.len(),
        interval_secs = config.sync.interval_secs,
        "Loaded configuration from {:?}",
        config_path
    );

    let pipeline = Pipeline::build(&config)?;
    pipeline.scheduler.start();
    print_ok(format!(
        "Sync scheduled {} ({} endpoint(s))",
        pipeline.scheduler.cadence(),
        pipeline.gateway.endpoints().len()
    ));

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let api_task = if config.api.enabled {
        let addr = config.api_socket_addr();
        let app = api::router(
            Arc::new(ApiState::new(pipeline.scheduler.clone())),
            config.api.cors_enabled,
        );
        print_ok(format!("API listening on http://{}", addr));
        Some(tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.changed().await;
            };
            if let Err(e) = api::serve(addr, app, shutdown).await {
                error!("API server stopped: {}", e);
            }
        }))
    } else {
        info!("API disabled");
        None
    };

    wait_for_shutdown().await;

    info!("Shutting down");
    pipeline.scheduler.stop();
    let _ = shutdown_tx.send(true);

    if let Some(task) = api_task {
        if let Err(e) = task.await {
            warn!("API task ended abnormally: {}", e);
        }
    }

    pipeline.store.flush()?;
    info!("Pulse daemon stopped");
    Ok(())
}

pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => info!("Received SIGINT"),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to install signal handlers, falling back to Ctrl+C: {}", e);
            }
        }
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C");
}
