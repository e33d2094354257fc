mod config;
mod error;
mod ingest;
mod loot;
mod reference;
mod report;
mod routes;
mod server;
mod service;
mod store;

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use config::{AppConfig, CliArgs, LOG_FILE_PREFIX};
use service::GuildSim;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = AppConfig::from_args(args);

    // Held until exit so buffered file logs are flushed
    let _log_guard = init_tracing(&config);

    info!("Starting guild-sim v{}", env!("CARGO_PKG_VERSION"));
    info!("Report database: {:?}", config.db_path());
    info!("Report base URL: {}", config.report_base_url);

    let service = Arc::new(GuildSim::from_config(&config)?);

    let router = server::build_router(service);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("guild-sim listening on http://0.0.0.0:{}", config.port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("guild-sim shutting down");
    Ok(())
}

fn init_tracing(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "guild_sim=info,tower_http=info".into());

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    guard
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
