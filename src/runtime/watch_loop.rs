//! # Watch Loop
//!
//! Runs `kube_runtime::Controller` over `Pipeline` resources in all namespaces
//! and restarts it when the watch stream ends.

use crate::config::SharedControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::Pipeline;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{controller, watcher, Controller};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Run the controller until a shutdown signal arrives
pub async fn run_watch_loop(
    pipelines: Api<Pipeline>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    controller_config: SharedControllerConfig,
    shutdown: CancellationToken,
) {
    spawn_signal_handler(shutdown.clone(), server_state.clone());

    let backoff_start_ms = controller_config.read().await.backoff_start_ms;
    let watch_backoff_ms = Arc::new(AtomicU64::new(backoff_start_ms));

    loop {
        if shutdown.is_cancelled() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let config = controller_config.read().await;
        let concurrency = config.max_concurrent_reconciliations;
        drop(config);

        info!(
            "Starting controller watch loop (max {} concurrent reconciliations)...",
            concurrency
        );

        let controller_config_for_filter = controller_config.clone();
        let watch_backoff = watch_backoff_ms.clone();
        let controller_future =
            Controller::new(pipelines.clone(), watcher::Config::default().any_semantic())
                .with_config(controller::Config::default().concurrency(concurrency))
                .shutdown_on_signal()
                .run(reconcile, handle_reconciliation_error, reconciler.clone())
                .for_each(move |result| {
                    let backoff = watch_backoff.clone();
                    let config = controller_config_for_filter.clone();
                    async move {
                        match result {
                            Ok((object, _action)) => {
                                backoff.store(
                                    config.read().await.backoff_start_ms,
                                    Ordering::Relaxed,
                                );
                                debug!(resource = %object, "watch.event.success");
                            }
                            Err(controller::Error::ReconcilerFailed(e, object)) => {
                                debug!(resource = %object, "Reconciliation failed: {}", e);
                            }
                            Err(e) => {
                                let config = config.read().await;
                                let max_backoff_ms = config.backoff_max_ms;
                                let restart_delay = config.watch_restart_delay_duration();
                                drop(config);
                                handle_watch_stream_error(
                                    &format!("{e:?}"),
                                    &backoff,
                                    max_backoff_ms,
                                    restart_delay,
                                )
                                .await;
                            }
                        }
                    }
                });

        // shutdown_on_signal ends the stream once in-flight reconciliations finish
        controller_future.await;

        if shutdown.is_cancelled() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let delay = controller_config
            .read()
            .await
            .watch_restart_delay_after_end_duration();
        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }

    info!("Controller stopped gracefully");
}

/// Cancel `shutdown` and drop readiness on SIGINT or SIGTERM
fn spawn_signal_handler(shutdown: CancellationToken, server_state: Arc<ServerState>) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal, initiating graceful shutdown...");
        server_state.set_ready(false);
        shutdown.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
