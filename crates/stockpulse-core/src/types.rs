use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item fetched from a community listing. Immutable once fetched; a run
/// owns the posts it fetched and only the ranked subset survives in the
/// snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,
    /// Self-text body; empty when the post is link-only.
    pub body: String,
    /// Community-assigned popularity. Can go negative.
    pub score: i64,
    pub created_utc: i64,
    pub community: String,
    pub permalink: String,
    pub author: String,
}

/// Per-symbol totals accumulated over one pipeline run.
///
/// `posts` keeps fetch order and allows duplicates: every match occurrence
/// appends the post again, so repeated emphasis within one post counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolAggregate {
    pub symbol: String,
    pub mentions: u64,
    pub positive_mentions: u64,
    pub negative_mentions: u64,
    /// `positive_mentions - negative_mentions`, filled in at finalize time.
    pub sentiment_score: i64,
    /// `mentions * sentiment_score`; used only for ordering.
    pub ranking_score: i64,
    pub posts: Vec<Post>,
}

impl SymbolAggregate {
    #[must_use]
    pub fn new(symbol: String) -> Self {
        Self {
            symbol,
            mentions: 0,
            positive_mentions: 0,
            negative_mentions: 0,
            sentiment_score: 0,
            ranking_score: 0,
            posts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotStatus {
    Ok,
    Error,
}

/// The persisted artifact of one pipeline run. Wholly superseded by the next
/// run's snapshot; readers must treat it as immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stocks: Vec<SymbolAggregate>,
    pub generated_at: DateTime<Utc>,
    pub communities_scanned: usize,
    pub status: SnapshotStatus,
}

impl Snapshot {
    /// An empty error-status snapshot, written when a run fails outside the
    /// per-community isolation.
    #[must_use]
    pub fn error(communities_scanned: usize) -> Self {
        Self {
            stocks: Vec::new(),
            generated_at: Utc::now(),
            communities_scanned,
            status: SnapshotStatus::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post() -> Post {
        Post {
            title: "AAPL to the moon".to_string(),
            body: String::new(),
            score: 42,
            created_utc: 1_700_000_000,
            community: "pennystocks".to_string(),
            permalink: "/r/pennystocks/comments/abc".to_string(),
            author: "trader123".to_string(),
        }
    }

    #[test]
    fn snapshot_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SnapshotStatus::Ok).unwrap(), "\"ok\"");
        assert_eq!(
            serde_json::to_string(&SnapshotStatus::Error).unwrap(),
            "\"error\""
        );
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut aggregate = SymbolAggregate::new("AAPL".to_string());
        aggregate.mentions = 3;
        aggregate.positive_mentions = 2;
        aggregate.sentiment_score = 2;
        aggregate.ranking_score = 6;
        aggregate.posts.push(sample_post());

        let snapshot = Snapshot {
            stocks: vec![aggregate],
            generated_at: Utc::now(),
            communities_scanned: 4,
            status: SnapshotStatus::Ok,
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let back: Snapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }

    #[test]
    fn error_snapshot_is_empty() {
        let snapshot = Snapshot::error(4);
        assert!(snapshot.stocks.is_empty());
        assert_eq!(snapshot.communities_scanned, 4);
        assert_eq!(snapshot.status, SnapshotStatus::Error);
    }
}
