//! `stockpulse-cli run` — one out-of-process pipeline pass.
//!
//! The external-scheduler flow: a cron or CI job runs this binary, the
//! snapshot lands in the shared store, and the running server is poked over
//! its notify hook so connected dashboards refresh.

use anyhow::Context;

use stockpulse_core::{AppConfig, MatchRules, SnapshotStatus};
use stockpulse_store::{FileStore, SnapshotStore, SNAPSHOT_KEY};

pub(crate) async fn execute(config: &AppConfig, notify_url: Option<String>) -> anyhow::Result<()> {
    let rules = match &config.rules_path {
        Some(path) => stockpulse_core::load_rules(path)?,
        None => MatchRules::default(),
    };
    let store = FileStore::new(config.data_dir.clone());

    let snapshot = stockpulse_pipeline::run(config, &rules).await;
    store
        .set(SNAPSHOT_KEY, &snapshot)
        .await
        .context("failed to persist snapshot")?;

    if snapshot.status == SnapshotStatus::Error {
        // The error snapshot is on disk for the dashboard; the job itself
        // still fails so the scheduler surfaces it.
        anyhow::bail!("pipeline run failed; error snapshot persisted");
    }

    tracing::info!(
        stocks = snapshot.stocks.len(),
        communities = snapshot.communities_scanned,
        "pipeline run persisted"
    );

    if let Some(url) = notify_url.or_else(|| config.notify_url.clone()) {
        notify_server(config, &url).await?;
    }

    Ok(())
}

async fn notify_server(config: &AppConfig, base_url: &str) -> anyhow::Result<()> {
    let secret = config
        .worker_secret
        .as_deref()
        .context("STOCKPULSE_WORKER_SECRET is required to notify a server")?;

    let url = format!("{}/api/v1/notify", base_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .bearer_auth(secret)
        .send()
        .await
        .with_context(|| format!("failed to reach {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("notify call to {url} failed with status {}", response.status());
    }

    tracing::info!(url = %url, "server notified of new snapshot");
    Ok(())
}
