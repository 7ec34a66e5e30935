//! Daily historical rate retrieval abstraction

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::currency::CurrencyCode;

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Label identifying the data provider in reports.
    fn label(&self) -> &str;

    /// The only base currency the provider quotes against, if it is restricted.
    fn supported_base(&self) -> Option<&CurrencyCode> {
        None
    }

    /// Fetches the rate of one unit of `base` in `quote` on `date`.
    ///
    /// Performs exactly one outbound request and never retries.
    async fn fetch_daily_rate(
        &self,
        base: &CurrencyCode,
        quote: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<f64>;
}
