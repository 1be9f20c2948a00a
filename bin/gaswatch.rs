use std::sync::Arc;

use anyhow::Context;
use jemallocator::Jemalloc;
use log::{error, info, LevelFilter};
use simple_logger::SimpleLogger;
use tokio_util::sync::CancellationToken;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use gaswatch::{CronScheduler, GasStationClient, PollContext, PostgresClient, Renderer, Settings};

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    SimpleLogger::new()
        .with_level(LevelFilter::Info)
        .env()
        .init()
        .context("Failed to initialize logger")?;

    // Load configuration
    let settings = Settings::new()
        .context("Failed to load configuration from config.yaml / GASWATCH__* environment")?;

    let postgres = Arc::new(
        PostgresClient::new(settings.postgres.clone())
            .await
            .context("Failed to initialize database connection")?,
    );
    info!("🤖 successfully connected to cluster 🤖");

    postgres
        .migrate()
        .await
        .context("Failed to apply database schema")?;
    postgres
        .health_check()
        .await
        .context("PostgreSQL health check failed")?;

    let source = GasStationClient::new(&settings.source)?;

    let ctx = Arc::new(PollContext::new(
        postgres.clone(),
        Arc::new(source),
        Renderer::new(settings.chart.clone()),
        settings.source.api_key_name.clone(),
    ));

    let cancellation_token = CancellationToken::new();
    let outcome = run_poller(
        CronScheduler::new(ctx, settings.scheduler.clone()),
        cancellation_token,
    )
    .await;

    postgres.close();

    if let Err(e) = &outcome {
        error!("gaswatch stopped: {:#}", e);
    }
    outcome
}

async fn run_poller(
    scheduler: CronScheduler,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let cron_token = cancellation_token.child_token();
    let mut cron_handle = tokio::spawn(async move { scheduler.run(cron_token).await });

    #[cfg(unix)]
    let mut sigterm_stream = {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?
    };

    info!("Poller running. Press Ctrl+C to stop.");

    #[cfg(unix)]
    let stopped_by_scheduler = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            None
        },
        _ = sigterm_stream.recv() => {
            info!("Received SIGTERM, exiting gracefully...");
            None
        },
        res = &mut cron_handle => Some(res),
    };

    #[cfg(not(unix))]
    let stopped_by_scheduler = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal (Ctrl+C), exiting gracefully...");
            None
        },
        res = &mut cron_handle => Some(res),
    };

    let result = match stopped_by_scheduler {
        Some(res) => res,
        None => {
            cancellation_token.cancel();
            info!("Waiting for cron scheduler to stop...");
            cron_handle.await
        },
    };

    result.context("Cron scheduler task panicked")?
}
