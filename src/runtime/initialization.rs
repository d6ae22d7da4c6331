//! # Initialization
//!
//! Controller initialization logic including rustls setup, tracing, metrics,
//! server startup, and Kubernetes/Fleet Management client setup.

use crate::config::{
    controller::LogFormat, create_shared_config, FleetClientConfig, SharedControllerConfig,
    SharedServerConfig,
};
use crate::controller::reconciler::{Engine, EngineSettings, KubePipelineStore, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::crd::Pipeline;
use crate::observability::metrics::PrometheusMetrics;
use crate::provider::fleet::FleetClient;
use anyhow::{Context, Result};
use kube::{api::Api, api::ListParams, Client};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Initialization result containing all necessary components for the controller
pub struct InitializationResult {
    /// API for Pipeline resources across all namespaces
    pub pipelines: Api<Pipeline>,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    /// Root cancellation token, cancelled on shutdown
    pub shutdown: CancellationToken,
    pub controller_config: SharedControllerConfig,
    pub server_config: SharedServerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registry creation
/// - HTTP server startup
/// - Kubernetes and Fleet Management client creation
/// - Engine and reconciler setup
///
/// # Errors
/// Returns an error if any client cannot be created or the server does not start
pub async fn initialize() -> Result<InitializationResult> {
    // Must run before anything opens a TLS connection
    let provider_installed = rustls::crypto::ring::default_provider()
        .install_default()
        .is_ok();

    let (controller_config, server_config) = create_shared_config();

    init_tracing(controller_config.read().await.log_format);
    if !provider_installed {
        warn!("rustls crypto provider was already installed");
    }

    info!("Starting Fleet Pipeline Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    let metrics =
        Arc::new(PrometheusMetrics::new().context("Failed to register Prometheus metrics")?);
    let server_state = Arc::new(ServerState::new(metrics.clone()));

    let server_port = server_config.read().await.metrics_port;
    let server_state_clone = server_state.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, server_config.clone()).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let fleet_config = FleetClientConfig::from_env()
        .context("Failed to load Fleet Management client configuration")?;
    info!(
        "Fleet Management endpoint: {} ({} req/s)",
        fleet_config.base_url, fleet_config.requests_per_second
    );
    let fleet_client =
        FleetClient::new(&fleet_config).context("Failed to create Fleet Management client")?;

    let config = controller_config.read().await;
    let defaults = EngineSettings::default();
    let settings = EngineSettings {
        rate_limit_delay: config.rate_limit_requeue_duration(),
        remote_call_timeout: defaults.remote_call_timeout.max(fleet_config.request_timeout),
    };
    let engine = Engine::new(
        Arc::new(KubePipelineStore::new(client.clone())),
        Arc::new(fleet_client),
        metrics,
        settings,
    );

    let shutdown = CancellationToken::new();
    let reconciler = Arc::new(Reconciler::new(
        engine,
        config.backoff_start_ms,
        config.backoff_max_ms,
        shutdown.clone(),
    ));
    drop(config);

    let pipelines: Api<Pipeline> = Api::all(client);
    check_crd_queryable(&pipelines).await;

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        pipelines,
        reconciler,
        server_state,
        shutdown,
        controller_config,
        server_config,
    })
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fleet_pipeline_controller=info".into());

    let result = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };
    if let Err(e) = result {
        eprintln!("Tracing subscriber already initialized: {e}");
    }
}

/// Wait until the HTTP server has bound its listener
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: SharedServerConfig,
) -> Result<()> {
    let config = server_config.read().await;
    let startup_timeout = config.startup_timeout();
    let poll_interval = config.poll_interval();
    drop(config);
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.ready() {
            info!("HTTP server is ready and accepting connections");
            break;
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }

    Ok(())
}

/// Log whether the Pipeline CRD is installed
///
/// The watch starts either way; a missing CRD surfaces as 404 watch errors
/// until it is applied.
async fn check_crd_queryable(pipelines: &Api<Pipeline>) {
    match pipelines.list(&ListParams::default().limit(1)).await {
        Ok(list) => info!(
            "Pipeline CRD is queryable ({} resource(s) in first page)",
            list.items.len()
        ),
        Err(e) => {
            warn!("Pipeline CRD is not queryable yet: {}", e);
            warn!("   Apply it with: cargo run --bin crdgen | kubectl apply -f -");
        }
    }
}
