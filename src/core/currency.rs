//! Currency conversion abstractions

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mapping of ISO-4217-like currency codes to display names, exactly as the
/// upstream currency listing returns it.
pub type CurrencyTable = HashMap<String, String>;

/// A single conversion result. The rate is implied (converted amount divided
/// by source amount) rather than independently fetched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionQuote {
    /// Amount expressed in the target currency.
    pub amount: f64,
    /// Implied exchange rate.
    pub rate: f64,
}

#[async_trait]
pub trait RateProvider: Send + Sync {
    async fn currencies(&self) -> Result<CurrencyTable>;

    async fn convert(&self, from: &str, to: &str, amount: f64) -> Result<ConversionQuote>;
}
