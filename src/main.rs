use std::time::Duration;

use storefront::app::Storefront;
use storefront::config::Settings;
use storefront::http;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;

    // RUST_LOG wins over the configured filter
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.log_filter)))
        .init();

    tracing::info!("🚀 Starting storefront");
    tracing::info!(
        transport = ?settings.bus.transport,
        failure_policy = ?settings.bus.failure_policy,
        surcharge_percent = settings.shipping.surcharge_percent,
        "Settings loaded"
    );

    let (app, worker) = Storefront::build(&settings)?;
    tracing::info!("📊 Metrics registry created with {} metrics", app.metrics.registry().gather().len());

    http::serve(app, &settings.http).await?;

    // The server dropped the last bus handle, so the worker drains and stops
    if let Some(worker) = worker {
        tracing::info!("⏳ Draining queued deliveries...");
        match tokio::time::timeout(Duration::from_secs(10), worker.join()).await {
            Ok(Ok(stats)) => tracing::info!(
                events = stats.events,
                commands = stats.commands,
                retries = stats.retries,
                dead_lettered = stats.dead_lettered,
                "Queue worker stopped"
            ),
            Ok(Err(e)) => tracing::error!(error = %e, "Queue worker failed"),
            Err(_) => tracing::warn!("Queue worker did not drain in time"),
        }
    }

    tracing::info!("👋 Storefront stopped");
    Ok(())
}
