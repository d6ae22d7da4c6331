//! # Fleet Pipeline Controller
//!
//! A Kubernetes controller that keeps Grafana Fleet Management pipelines in
//! sync with `Pipeline` custom resources.
//!
//! ## Overview
//!
//! 1. **Finalizer first** - every `Pipeline` gets a finalizer before any remote call
//! 2. **Generation gate** - unchanged specs never reach Fleet Management
//! 3. **Full upserts** - every spec field is sent on every `UpsertPipeline` call
//! 4. **Guarded deletes** - the finalizer is released only after `DeletePipeline` succeeds
//!
//! ## Configuration
//!
//! `FLEET_BASE_URL`, `FLEET_USERNAME` and `FLEET_PASSWORD` select the Fleet
//! Management stack. See `config/` for the remaining tunables.

use anyhow::Result;
use fleet_pipeline_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(
        init.pipelines,
        init.reconciler,
        init.server_state,
        init.controller_config,
        init.shutdown,
    )
    .await;

    Ok(())
}
