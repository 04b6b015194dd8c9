//! Periodic driver for the inbound sync engine.
//!
//! One tokio task: short startup delay, then a fixed interval. Batches run
//! to completion inside the task, so two batches never overlap; a batch that
//! outlasts the interval simply delays the next tick. Per-user store locks
//! additionally serialize each pull against live request handlers.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::context::SyncContext;
use crate::inbound;

/// Run the periodic sync loop forever.
pub async fn run(ctx: Arc<SyncContext>) {
    let startup_delay = Duration::from_secs(ctx.config.startup_delay_secs);
    let interval_period = Duration::from_secs(ctx.config.sync_interval_secs);

    info!(
        delay_secs = ctx.config.startup_delay_secs,
        interval_secs = ctx.config.sync_interval_secs,
        "starting periodic sync scheduler"
    );
    tokio::time::sleep(startup_delay).await;

    let mut interval = tokio::time::interval(interval_period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        inbound::run_batch(&ctx).await;
    }
}
