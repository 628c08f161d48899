use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub worker_secret: Option<String>,
    pub data_dir: PathBuf,
    pub rules_path: Option<PathBuf>,
    pub communities: Vec<String>,
    pub reddit_base_url: String,
    pub fetch_timeout_secs: u64,
    pub page_limit: usize,
    pub fetch_cooldown_ms: u64,
    pub community_delay_ms: u64,
    pub keepalive_interval_secs: u64,
    pub user_agent: String,
    pub alpha_vantage_key: String,
    pub notify_url: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "worker_secret",
                &self.worker_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("data_dir", &self.data_dir)
            .field("rules_path", &self.rules_path)
            .field("communities", &self.communities)
            .field("reddit_base_url", &self.reddit_base_url)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("page_limit", &self.page_limit)
            .field("fetch_cooldown_ms", &self.fetch_cooldown_ms)
            .field("community_delay_ms", &self.community_delay_ms)
            .field("keepalive_interval_secs", &self.keepalive_interval_secs)
            .field("user_agent", &self.user_agent)
            .field("alpha_vantage_key", &"[redacted]")
            .field("notify_url", &self.notify_url)
            .finish()
    }
}
