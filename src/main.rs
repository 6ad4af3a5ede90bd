use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use medux_feed::app_state::build_app_state;
use medux_feed::core::config::app_config::AppConfig;
use medux_feed::debug::run_debug;
use medux_feed::routes::app_router;
use medux_feed::scheduler::start_scheduler;
use medux_feed::shutdown::wait_for_signal;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "medux-feed.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();

    info!(
        "🚀 Starting medux-feed against {} (token {})",
        config.api_url,
        config.token.masked()
    );

    let debug_mode = config.debug_mode;
    let addr = config.server_addr.clone();
    let state = build_app_state(config)?;

    if debug_mode {
        run_debug(&state).await;
        return Ok(());
    }

    let scheduler = start_scheduler(state.clone());

    let app = app_router().with_state(state);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("🌐 Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal(tokio::signal::ctrl_c()))
        .await?;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    info!("👋 Server stopped");
    Ok(())
}
