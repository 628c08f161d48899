//! One full pipeline run over the configured communities.

use std::time::Duration;

use chrono::Utc;

use stockpulse_core::{AppConfig, MatchRules, Snapshot, SnapshotStatus};

use crate::aggregate::SymbolTable;
use crate::error::PipelineError;
use crate::extract::extract;
use crate::reddit::RedditClient;
use crate::sentiment::classify;

/// Execute one complete pipeline run and return its snapshot.
///
/// Communities are scanned sequentially; a failed fetch is isolated to its
/// community (logged, treated as zero posts) and never aborts the run. Any
/// error that escapes that isolation is caught here and converted into an
/// empty `status = error` snapshot. Persisting the snapshot and signalling
/// listeners is the caller's job.
pub async fn run(config: &AppConfig, rules: &MatchRules) -> Snapshot {
    match try_run(config, rules).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::error!(error = %e, "pipeline run failed; recording error snapshot");
            Snapshot::error(config.communities.len())
        }
    }
}

async fn try_run(config: &AppConfig, rules: &MatchRules) -> Result<Snapshot, PipelineError> {
    let client = RedditClient::new(config)?;
    let cooldown = Duration::from_millis(config.fetch_cooldown_ms);
    let community_delay = Duration::from_millis(config.community_delay_ms);

    let mut table = SymbolTable::new();

    for community in &config.communities {
        let posts = match client.fetch_new_posts(community).await {
            Ok(posts) => {
                tracing::info!(community = %community, count = posts.len(), "fetched posts");
                posts
            }
            Err(e) => {
                tracing::warn!(
                    community = %community,
                    error = %e,
                    "community fetch failed; continuing with zero posts"
                );
                Vec::new()
            }
        };

        // Rate-limit courtesy delay after every fetch, success or failure.
        tokio::time::sleep(cooldown).await;

        for post in &posts {
            let text = format!("{} {}", post.title, post.body);
            let candidates = extract(&text, rules);
            if candidates.is_empty() {
                continue;
            }
            let sentiment = classify(&text, rules);
            table.record(post, &candidates, sentiment);
        }

        tokio::time::sleep(community_delay).await;
    }

    let symbol_count = table.symbol_count();
    let stocks = table.finalize();
    tracing::info!(
        symbols_seen = symbol_count,
        ranked = stocks.len(),
        communities = config.communities.len(),
        "pipeline run complete"
    );

    Ok(Snapshot {
        stocks,
        generated_at: Utc::now(),
        communities_scanned: config.communities.len(),
        status: SnapshotStatus::Ok,
    })
}
