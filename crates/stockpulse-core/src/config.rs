use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let env = parse_environment(&or_default("STOCKPULSE_ENV", "development"));

    let worker_secret = lookup("STOCKPULSE_WORKER_SECRET")
        .ok()
        .filter(|s| !s.trim().is_empty());

    let bind_addr = parse_addr("STOCKPULSE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("STOCKPULSE_LOG_LEVEL", "info");
    let data_dir = PathBuf::from(or_default("STOCKPULSE_DATA_DIR", "./data"));
    let rules_path = lookup("STOCKPULSE_RULES_PATH").ok().map(PathBuf::from);

    let communities = parse_communities(&or_default(
        "STOCKPULSE_COMMUNITIES",
        "pennystocks,wallstreetbets,10xPennyStocks,SmallStreetBets",
    ))?;

    let reddit_base_url = or_default("STOCKPULSE_REDDIT_BASE_URL", "https://www.reddit.com")
        .trim_end_matches('/')
        .to_string();
    let fetch_timeout_secs = parse_u64("STOCKPULSE_FETCH_TIMEOUT_SECS", "15")?;
    let page_limit = parse_usize("STOCKPULSE_PAGE_LIMIT", "100")?;
    let fetch_cooldown_ms = parse_u64("STOCKPULSE_FETCH_COOLDOWN_MS", "2000")?;
    let community_delay_ms = parse_u64("STOCKPULSE_COMMUNITY_DELAY_MS", "1000")?;
    let keepalive_interval_secs = parse_u64("STOCKPULSE_KEEPALIVE_INTERVAL_SECS", "15")?;

    // Reddit's public JSON listing rejects obviously non-browser agents.
    let user_agent = or_default(
        "STOCKPULSE_USER_AGENT",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    );

    let alpha_vantage_key = or_default("STOCKPULSE_ALPHA_VANTAGE_KEY", "demo");
    let notify_url = lookup("STOCKPULSE_NOTIFY_URL")
        .ok()
        .map(|s| s.trim_end_matches('/').to_string());

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        worker_secret,
        data_dir,
        rules_path,
        communities,
        reddit_base_url,
        fetch_timeout_secs,
        page_limit,
        fetch_cooldown_ms,
        community_delay_ms,
        keepalive_interval_secs,
        user_agent,
        alpha_vantage_key,
        notify_url,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

/// Split a comma-separated community list, dropping empty segments.
fn parse_communities(raw: &str) -> Result<Vec<String>, ConfigError> {
    let communities: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    if communities.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "STOCKPULSE_COMMUNITIES".to_string(),
            reason: "must list at least one community".to_string(),
        });
    }

    Ok(communities)
}
