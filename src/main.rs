//! Binary entry point: resolve configuration, initialize logging, build the
//! sinks, install the shutdown signal, and drive the agent to completion.

use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use dockwatch::{wait_for_shutdown_signal, Agent, AlertSink, Config, LogSink, WebhookSink};

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dockwatch: {e}");
            return ExitCode::from(2);
        }
    };

    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    for warning in config.startup_warnings() {
        tracing::warn!("{warning}");
    }
    tracing::info!(endpoint = %config.endpoint, "starting watcher");

    let mut sinks: Vec<Arc<dyn AlertSink>> = vec![Arc::new(LogSink::new())];
    if let Some(url) = config.webhook_url.clone() {
        match WebhookSink::new(url, config.http_timeout) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(e) => {
                tracing::warn!(error = %e, "webhook sink unavailable; alerts will only be logged");
            }
        }
    }

    let token = CancellationToken::new();
    let agent = tokio::spawn(Agent::new(config, sinks).run(token.clone()));

    match wait_for_shutdown_signal().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "signal listener failed; shutting down"),
    }
    token.cancel();

    if agent.await.is_err() {
        tracing::error!("agent task panicked during shutdown");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}
