//! Cron scheduler driving the gas price polling cycle.
//!
//! A single repeated job runs [`jobs::poll_gas_price`] every
//! `interval_secs`. Ticks never overlap: a tick that finds the previous
//! cycle still running is skipped with a warning.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::sync::{mpsc, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;

use crate::config::{ErrorPolicy, SchedulerSettings};
use crate::error::GasWatchError;

use super::jobs;
use super::jobs::poll_gas_price::PollContext;

/// Cron scheduler that owns the polling job for the process lifetime.
pub struct CronScheduler {
    ctx: Arc<PollContext>,
    settings: SchedulerSettings,
}

/// Runs one cycle on its own task so a panic inside it is reported as a
/// failed cycle instead of silently killing the scheduler tick.
async fn run_cycle(
    ctx: Arc<PollContext>,
    timeout: Option<Duration>,
) -> Result<(), GasWatchError> {
    let handle = tokio::spawn(async move {
        let cycle = jobs::poll_gas_price::run(&ctx);
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, cycle).await {
                Ok(result) => result,
                Err(_) => Err(GasWatchError::Timeout(limit)),
            },
            None => cycle.await,
        }
    });

    handle
        .await
        .map_err(|e| GasWatchError::Panicked(e.to_string()))??;
    Ok(())
}

impl CronScheduler {
    pub fn new(ctx: Arc<PollContext>, settings: SchedulerSettings) -> Self {
        Self { ctx, settings }
    }

    /// Starts the scheduler and runs until cancellation.
    ///
    /// Under [`ErrorPolicy::FailFast`] the first failed cycle stops the
    /// scheduler and is returned as the error.
    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let mut scheduler = JobScheduler::new().await?;
        let (failure_tx, mut failure_rx) = mpsc::channel::<GasWatchError>(1);
        let halted = cancellation_token.child_token();

        self.register_poll_job(&scheduler, failure_tx, halted.clone())
            .await?;

        scheduler.start().await?;
        info!(
            "Cron scheduler started, polling every {}s",
            self.settings.interval_secs
        );

        let outcome = tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Cron scheduler shutting down...");
                Ok(())
            },
            Some(e) = failure_rx.recv() => {
                Err(anyhow::Error::new(e).context("Gas price cycle failed"))
            },
        };

        halted.cancel();
        scheduler
            .shutdown()
            .await
            .context("Failed to shut down cron scheduler")?;
        outcome
    }

    async fn register_poll_job(
        &self,
        scheduler: &JobScheduler,
        failure_tx: mpsc::Sender<GasWatchError>,
        halted: CancellationToken,
    ) -> Result<()> {
        let ctx = self.ctx.clone();
        let interval = self.settings.interval_secs.max(1);
        let policy = self.settings.on_error;
        let timeout = (self.settings.cycle_timeout_secs > 0)
            .then(|| Duration::from_secs(self.settings.cycle_timeout_secs));
        let in_flight = Arc::new(Mutex::new(()));

        let job = Job::new_repeated_async(Duration::from_secs(interval), move |_uuid, _lock| {
            let ctx = ctx.clone();
            let failure_tx = failure_tx.clone();
            let halted = halted.clone();
            let in_flight = in_flight.clone();
            Box::pin(async move {
                if halted.is_cancelled() {
                    return;
                }
                let Ok(_running) = in_flight.try_lock() else {
                    warn!("Previous gas price cycle still running, skipping this tick");
                    return;
                };

                let Err(e) = run_cycle(ctx, timeout).await else {
                    return;
                };
                match policy {
                    ErrorPolicy::FailFast => {
                        error!("Gas price cycle failed: {:#}", e);
                        halted.cancel();
                        let _ = failure_tx.try_send(e);
                    },
                    ErrorPolicy::Skip => {
                        warn!("Gas price cycle failed, skipping: {:#}", e);
                    },
                }
            })
        })?;

        scheduler.add(job).await?;
        info!("Registered poll_gas_price job (every {}s)", interval);
        Ok(())
    }
}
