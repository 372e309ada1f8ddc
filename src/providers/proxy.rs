use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::core::currency::{ConversionQuote, CurrencyTable, RateProvider};

/// Client for the rate proxy's local HTTP contract (`/currencies` and
/// `/convert` under a single API base URL).
///
/// The conversion form never talks to the upstream exchange-rate API
/// directly; it goes through the proxy and surfaces the proxy's error
/// message text as-is.
pub struct ProxyClient {
    api_url: String,
}

impl ProxyClient {
    pub fn new(api_url: &str) -> Self {
        ProxyClient {
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Failure payload the proxy uses for every error status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[async_trait]
impl RateProvider for ProxyClient {
    async fn currencies(&self) -> Result<CurrencyTable> {
        let url = format!("{}/currencies", self.api_url);
        debug!("Requesting currency table from proxy at {}", url);

        let client = reqwest::Client::builder().user_agent("kurs/0.2").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for currency listing URL: {}", e, url))?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(anyhow!(proxy_error(&text, status)));
        }

        let table: CurrencyTable = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse currency listing from proxy: {}", e))?;
        Ok(table)
    }

    async fn convert(&self, from: &str, to: &str, amount: f64) -> Result<ConversionQuote> {
        let url = format!("{}/convert", self.api_url);
        debug!("Requesting conversion from proxy at {}", url);

        let client = reqwest::Client::builder().user_agent("kurs/0.2").build()?;
        let response = client
            .get(&url)
            .query(&[
                ("from", from),
                ("to", to),
                ("amount", amount.to_string().as_str()),
            ])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for conversion: {}->{}", e, from, to))?;

        let status = response.status();
        let text = response.text().await?;

        // An error body wins over the status line so the proxy's own message
        // reaches the user unchanged.
        if let Ok(body) = serde_json::from_str::<ErrorBody>(&text) {
            return Err(anyhow!(body.error));
        }
        if !status.is_success() {
            return Err(anyhow!("HTTP error: {} from rate proxy", status));
        }

        let quote: ConversionQuote = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse proxy response for {from}->{to}: {e}"))?;
        Ok(quote)
    }
}

fn proxy_error(body: &str, status: reqwest::StatusCode) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => format!("HTTP error: {status} from rate proxy"),
    }
}
