mod api;
mod middleware;
mod notify;

use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

use stockpulse_core::MatchRules;
use stockpulse_pipeline::QuoteClient;
use stockpulse_store::FileStore;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    notify::UpdateNotifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(stockpulse_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let rules = match &config.rules_path {
        Some(path) => stockpulse_core::load_rules(path)?,
        None => MatchRules::default(),
    };

    let store = FileStore::new(config.data_dir.clone());
    let notifier = UpdateNotifier::new();
    let _heartbeat = notifier.spawn_heartbeat(Duration::from_secs(config.keepalive_interval_secs));

    let quotes = Arc::new(QuoteClient::new(&config)?);

    let auth = AuthState::from_secret(
        config.worker_secret.clone(),
        matches!(config.env, stockpulse_core::Environment::Development),
    )?;

    let state = AppState {
        store,
        config: Arc::clone(&config),
        rules: Arc::new(rules),
        notifier,
        quotes,
        run_lock: Arc::new(tokio::sync::Mutex::new(())),
    };
    let app = build_app(state, auth, default_rate_limit_state());

    tracing::info!(addr = %config.bind_addr, env = %config.env, "starting stockpulse server");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
