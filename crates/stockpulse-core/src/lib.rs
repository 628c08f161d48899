mod app_config;
mod config;
mod rules;
mod types;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use rules::{load_rules, MatchRules};
pub use types::{Post, Snapshot, SnapshotStatus, SymbolAggregate};

/// Ranked snapshots never carry more than this many symbols.
pub const MAX_RANKED_SYMBOLS: usize = 20;

/// Symbols below this mention count are dropped before ranking.
pub const MIN_MENTIONS: u64 = 2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read rules file {path}: {source}")]
    RulesFileIo {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse rules file: {0}")]
    RulesFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
