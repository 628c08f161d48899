//! Per-symbol accumulation and ranking.

use std::collections::HashMap;

use stockpulse_core::{Post, SymbolAggregate, MAX_RANKED_SYMBOLS, MIN_MENTIONS};

use crate::sentiment::Sentiment;

/// Running per-symbol totals for one pipeline run.
///
/// Entries keep first-encountered order so the final stable sort breaks
/// ranking ties by encounter order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    index: HashMap<String, usize>,
    entries: Vec<SymbolAggregate>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one post's candidate symbols into the running totals.
    ///
    /// The sentiment classification is computed once per post by the caller
    /// and applied to every candidate occurrence: each occurrence bumps the
    /// mention count, re-appends the post, and bumps the matching sentiment
    /// counter. Totals accumulate additively across communities.
    pub fn record(&mut self, post: &Post, candidates: &[String], sentiment: Sentiment) {
        for symbol in candidates {
            let idx = match self.index.get(symbol) {
                Some(&idx) => idx,
                None => {
                    self.entries.push(SymbolAggregate::new(symbol.clone()));
                    let idx = self.entries.len() - 1;
                    self.index.insert(symbol.clone(), idx);
                    idx
                }
            };

            let entry = &mut self.entries[idx];
            entry.mentions += 1;
            entry.posts.push(post.clone());
            match sentiment {
                Sentiment::Positive => entry.positive_mentions += 1,
                Sentiment::Negative => entry.negative_mentions += 1,
                Sentiment::Neutral => {}
            }
        }
    }

    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.entries.len()
    }

    /// Produce the ranked symbol list: drop entries below the mention
    /// threshold, fill in the derived scores, stable-sort by ranking score
    /// descending, and keep the top entries.
    #[must_use]
    pub fn finalize(self) -> Vec<SymbolAggregate> {
        #[allow(clippy::cast_possible_wrap)]
        let mut ranked: Vec<SymbolAggregate> = self
            .entries
            .into_iter()
            .filter(|entry| entry.mentions >= MIN_MENTIONS)
            .map(|mut entry| {
                entry.sentiment_score =
                    entry.positive_mentions as i64 - entry.negative_mentions as i64;
                entry.ranking_score = entry.mentions as i64 * entry.sentiment_score;
                entry
            })
            .collect();

        // Vec::sort_by is stable, so equal scores keep encounter order.
        ranked.sort_by(|a, b| b.ranking_score.cmp(&a.ranking_score));
        ranked.truncate(MAX_RANKED_SYMBOLS);
        ranked
    }
}
