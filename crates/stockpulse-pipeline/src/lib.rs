//! Ticker-mention pipeline: fetch community listings, extract candidate
//! symbols, score naive sentiment, and aggregate into a ranked snapshot.

mod aggregate;
mod error;
mod extract;
mod quotes;
mod reddit;
mod run;
mod sentiment;

pub use aggregate::SymbolTable;
pub use error::{PipelineError, QuoteError};
pub use extract::extract;
pub use quotes::{Quote, QuoteClient};
pub use reddit::RedditClient;
pub use run::run;
pub use sentiment::{classify, Sentiment};
