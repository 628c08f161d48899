//! Best-effort price quotes via a fallback chain of free providers.
//!
//! Providers are tried in order; the first one that produces a usable quote
//! wins. Provider failures are logged and the chain continues, so a single
//! flaky upstream never breaks the endpoint on its own.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use stockpulse_core::AppConfig;

use crate::error::QuoteError;

const ALPHA_VANTAGE_BASE: &str = "https://www.alphavantage.co";
const YAHOO_BASE: &str = "https://query1.finance.yahoo.com";
const QUOTE_TIMEOUT_SECS: u64 = 5;

/// One price quote, with display-ready formatting: price/change to four
/// decimals, percent to two.
#[derive(Debug, Clone, Serialize)]
pub struct Quote {
    pub symbol: String,
    pub price: String,
    pub change: String,
    pub change_percent: String,
    pub last_updated: DateTime<Utc>,
}

impl Quote {
    fn from_raw(symbol: &str, price: f64, change: f64, change_percent: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            price: format!("{price:.4}"),
            change: format!("{change:.4}"),
            change_percent: format!("{change_percent:.2}"),
            last_updated: Utc::now(),
        }
    }
}

pub struct QuoteClient {
    client: reqwest::Client,
    alpha_vantage_base: String,
    yahoo_base: String,
    alpha_vantage_key: String,
}

impl QuoteClient {
    /// Build a quote client from application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Http`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &AppConfig) -> Result<Self, QuoteError> {
        Self::with_base_urls(
            &config.alpha_vantage_key,
            ALPHA_VANTAGE_BASE,
            YAHOO_BASE,
        )
    }

    /// Build a client against explicit provider base URLs (used by tests to
    /// point at a mock server).
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Http`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn with_base_urls(
        alpha_vantage_key: &str,
        alpha_vantage_base: &str,
        yahoo_base: &str,
    ) -> Result<Self, QuoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(QUOTE_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            alpha_vantage_base: alpha_vantage_base.trim_end_matches('/').to_string(),
            yahoo_base: yahoo_base.trim_end_matches('/').to_string(),
            alpha_vantage_key: alpha_vantage_key.to_string(),
        })
    }

    /// Fetch a quote for `symbol`, walking the provider chain.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::Unavailable`] when every provider either failed
    /// or returned no usable data.
    pub async fn fetch(&self, symbol: &str) -> Result<Quote, QuoteError> {
        match self.fetch_alpha_vantage(symbol).await {
            Ok(Some(quote)) => return Ok(quote),
            Ok(None) => tracing::debug!(symbol = %symbol, "alpha vantage returned no quote"),
            Err(e) => tracing::warn!(symbol = %symbol, error = %e, "alpha vantage quote failed"),
        }

        match self.fetch_yahoo_chart(symbol).await {
            Ok(Some(quote)) => return Ok(quote),
            Ok(None) => tracing::debug!(symbol = %symbol, "yahoo chart returned no quote"),
            Err(e) => tracing::warn!(symbol = %symbol, error = %e, "yahoo chart quote failed"),
        }

        Err(QuoteError::Unavailable {
            symbol: symbol.to_string(),
        })
    }

    async fn fetch_alpha_vantage(&self, symbol: &str) -> Result<Option<Quote>, QuoteError> {
        let url = format!("{}/query", self.alpha_vantage_base);
        let body: serde_json::Value = self
            .client
            .get(&url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", &self.alpha_vantage_key),
            ])
            .send()
            .await?
            .json()
            .await?;

        let quote = &body["Global Quote"];
        let Some(price) = parse_number(&quote["05. price"]) else {
            return Ok(None);
        };
        let change = parse_number(&quote["09. change"]).unwrap_or(0.0);
        let change_percent = quote["10. change percent"]
            .as_str()
            .and_then(|s| s.trim_end_matches('%').parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(Some(Quote::from_raw(symbol, price, change, change_percent)))
    }

    async fn fetch_yahoo_chart(&self, symbol: &str) -> Result<Option<Quote>, QuoteError> {
        let url = format!("{}/v8/finance/chart/{symbol}", self.yahoo_base);
        let body: serde_json::Value = self
            .client
            .get(&url)
            .header("User-Agent", "Mozilla/5.0")
            .send()
            .await?
            .json()
            .await?;

        let meta = &body["chart"]["result"][0]["meta"];
        let (Some(price), Some(previous_close)) = (
            meta["regularMarketPrice"].as_f64(),
            meta["previousClose"].as_f64(),
        ) else {
            return Ok(None);
        };

        let change = price - previous_close;
        let change_percent = if previous_close == 0.0 {
            0.0
        } else {
            change / previous_close * 100.0
        };

        Ok(Some(Quote::from_raw(symbol, price, change, change_percent)))
    }
}

/// Alpha Vantage reports numbers as JSON strings.
fn parse_number(value: &serde_json::Value) -> Option<f64> {
    value
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| value.as_f64())
}
