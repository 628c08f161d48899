use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("listing fetch for r/{community} failed with status {status}")]
    UnexpectedStatus { community: String, status: u16 },

    #[error("listing parse error for r/{community}: {reason}")]
    Listing { community: String, reason: String },
}

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no quote provider returned data for {symbol}")]
    Unavailable { symbol: String },
}
