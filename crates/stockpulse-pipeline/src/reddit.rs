//! Reddit public JSON listing client.
//!
//! Pulls the newest posts of a community via the unauthenticated
//! `/r/<community>/new.json` listing. No OAuth: the public endpoint is enough
//! for a bounded page of recent posts, provided the User-Agent looks like a
//! browser.

use std::time::Duration;

use serde::Deserialize;

use stockpulse_core::{AppConfig, Post};

use crate::error::PipelineError;

/// Listing envelope returned by the JSON endpoint.
#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RawPost,
}

#[derive(Debug, Deserialize)]
struct RawPost {
    title: Option<String>,
    selftext: Option<String>,
    score: Option<i64>,
    created_utc: Option<f64>,
    subreddit: Option<String>,
    permalink: Option<String>,
    author: Option<String>,
}

impl RawPost {
    fn into_post(self, fallback_community: &str) -> Post {
        #[allow(clippy::cast_possible_truncation)]
        let created_utc = self.created_utc.unwrap_or(0.0) as i64;
        Post {
            title: self.title.unwrap_or_default(),
            body: self.selftext.unwrap_or_default(),
            score: self.score.unwrap_or(0),
            created_utc,
            community: self
                .subreddit
                .unwrap_or_else(|| fallback_community.to_string()),
            permalink: self.permalink.unwrap_or_default(),
            author: self.author.unwrap_or_else(|| "[deleted]".to_string()),
        }
    }
}

/// HTTP client over the public listing endpoint.
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    page_limit: usize,
}

impl RedditClient {
    /// Build a client with the configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Http`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: &AppConfig) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.reddit_base_url.clone(),
            user_agent: config.user_agent.clone(),
            page_limit: config.page_limit,
        })
    }

    /// Fetch one page of the newest posts in `community`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnexpectedStatus`] on a non-2xx response and
    /// [`PipelineError::Listing`] if the body does not parse as a listing.
    /// Timeouts surface as [`PipelineError::Http`].
    pub async fn fetch_new_posts(&self, community: &str) -> Result<Vec<Post>, PipelineError> {
        let url = format!("{}/r/{community}/new.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .query(&[("limit", self.page_limit.to_string())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::UnexpectedStatus {
                community: community.to_string(),
                status: response.status().as_u16(),
            });
        }

        let listing: Listing = response.json().await.map_err(|e| PipelineError::Listing {
            community: community.to_string(),
            reason: e.to_string(),
        })?;

        let posts: Vec<Post> = listing
            .data
            .children
            .into_iter()
            .map(|child| child.data.into_post(community))
            .collect();

        tracing::debug!(
            community = %community,
            count = posts.len(),
            "fetched community listing"
        );

        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_post_defaults_fill_missing_fields() {
        let raw = RawPost {
            title: None,
            selftext: None,
            score: None,
            created_utc: None,
            subreddit: None,
            permalink: None,
            author: None,
        };
        let post = raw.into_post("pennystocks");
        assert_eq!(post.title, "");
        assert_eq!(post.body, "");
        assert_eq!(post.score, 0);
        assert_eq!(post.created_utc, 0);
        assert_eq!(post.community, "pennystocks");
        assert_eq!(post.author, "[deleted]");
    }

    #[test]
    fn raw_post_truncates_fractional_timestamps() {
        let raw = RawPost {
            title: Some("t".to_string()),
            selftext: Some("b".to_string()),
            score: Some(-3),
            created_utc: Some(1_700_000_000.5),
            subreddit: Some("wallstreetbets".to_string()),
            permalink: Some("/r/wallstreetbets/comments/x".to_string()),
            author: Some("someone".to_string()),
        };
        let post = raw.into_post("ignored");
        assert_eq!(post.created_utc, 1_700_000_000);
        assert_eq!(post.score, -3);
        assert_eq!(post.community, "wallstreetbets");
    }

    #[test]
    fn listing_envelope_parses() {
        let body = r#"{
            "kind": "Listing",
            "data": {
                "children": [
                    { "kind": "t3", "data": { "title": "AAPL moon", "selftext": "", "score": 12, "created_utc": 1700000000.0, "subreddit": "pennystocks", "permalink": "/r/pennystocks/comments/abc", "author": "u1" } }
                ],
                "after": null
            }
        }"#;
        let listing: Listing = serde_json::from_str(body).expect("listing should parse");
        assert_eq!(listing.data.children.len(), 1);
    }
}
