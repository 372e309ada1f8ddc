use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::currency::{ConversionQuote, CurrencyTable, RateProvider};

/// Client for a Frankfurter-shaped exchange-rate API.
///
/// Two read-only endpoints are used: `/currencies` (code to display name)
/// and `/latest` (conversion of a base amount into a target currency).
/// Every call goes straight upstream; nothing is cached or retried.
pub struct FrankfurterProvider {
    base_url: String,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str) -> Self {
        FrankfurterProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    amount: f64,
    base: String,
    date: NaiveDate,
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateProvider for FrankfurterProvider {
    async fn currencies(&self) -> Result<CurrencyTable> {
        let url = format!("{}/currencies", self.base_url);
        debug!("Requesting currency table from {}", url);

        let client = reqwest::Client::builder().user_agent("kurs/0.2").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for currency listing URL: {}", e, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for currency listing",
                response.status()
            ));
        }

        let table = response
            .json::<CurrencyTable>()
            .await
            .map_err(|e| anyhow!("Failed to parse currency listing: {}", e))?;

        debug!("Fetched {} currencies", table.len());
        Ok(table)
    }

    #[instrument(
        name = "FrankfurterConvert",
        skip(self),
        fields(from = %from, to = %to)
    )]
    async fn convert(&self, from: &str, to: &str, amount: f64) -> Result<ConversionQuote> {
        // A zero or non-finite amount would make the implied rate undefined.
        if !amount.is_finite() || amount <= 0.0 {
            return Err(anyhow!(
                "Amount must be a positive number for conversion {from}->{to}, got {amount}"
            ));
        }

        let url = format!("{}/latest", self.base_url);
        debug!("Requesting conversion from {}", url);

        let client = reqwest::Client::builder().user_agent("kurs/0.2").build()?;
        let response = client
            .get(&url)
            .query(&[
                ("amount", amount.to_string().as_str()),
                ("from", from),
                ("to", to),
            ])
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for conversion: {}->{}", e, from, to))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for conversion: {}->{}",
                response.status(),
                from,
                to
            ));
        }

        let text = response.text().await?;

        let data: LatestRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse rates response for {from}->{to}: {e}"))?;

        debug!(
            "Latest rates as of {} for {} {}: {:?}",
            data.date, data.amount, data.base, data.rates
        );

        let converted = data
            .rates
            .get(to)
            .copied()
            .ok_or_else(|| anyhow!("No rate found for target currency: {}", to))?;

        Ok(ConversionQuote {
            amount: converted,
            rate: converted / amount,
        })
    }
}
