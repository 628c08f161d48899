//! `stockpulse-cli show` — print the persisted snapshot summary.

use stockpulse_core::AppConfig;
use stockpulse_store::{FileStore, SnapshotStore, SNAPSHOT_KEY};

pub(crate) async fn execute(config: &AppConfig) -> anyhow::Result<()> {
    let store = FileStore::new(config.data_dir.clone());

    let Some(snapshot) = store.get(SNAPSHOT_KEY).await? else {
        println!("no snapshot yet — run `stockpulse-cli run` first");
        return Ok(());
    };

    println!(
        "snapshot from {} ({:?}, {} communities scanned)",
        snapshot.generated_at, snapshot.status, snapshot.communities_scanned
    );
    for stock in &snapshot.stocks {
        println!(
            "  {:<6} mentions={:<4} +{}/-{} sentiment={} ranking={}",
            stock.symbol,
            stock.mentions,
            stock.positive_mentions,
            stock.negative_mentions,
            stock.sentiment_score,
            stock.ranking_score
        );
    }

    Ok(())
}
