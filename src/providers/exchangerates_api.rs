use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::{CurrencyCode, RateSource};

pub const SOURCE_LABEL: &str = "api.exchangeratesapi.io";

/// Historical daily rates from exchangeratesapi.io. The free tier only quotes against EUR.
pub struct ExchangeRatesApiProvider {
    base_url: String,
    access_key: String,
    fixed_base: CurrencyCode,
}

impl ExchangeRatesApiProvider {
    pub fn new(base_url: &str, access_key: &str) -> Result<Self> {
        Ok(ExchangeRatesApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.to_string(),
            fixed_base: CurrencyCode::parse("EUR")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HistoricalRatesResponse {
    #[serde(default)]
    date: Option<String>,
    rates: HashMap<String, f64>,
}

#[async_trait]
impl RateSource for ExchangeRatesApiProvider {
    fn label(&self) -> &str {
        SOURCE_LABEL
    }

    fn supported_base(&self) -> Option<&CurrencyCode> {
        Some(&self.fixed_base)
    }

    #[instrument(
        name = "ExchangeRatesFetch",
        skip(self),
        fields(base = %base, quote = %quote, date = %date)
    )]
    async fn fetch_daily_rate(
        &self,
        base: &CurrencyCode,
        quote: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<f64> {
        let day = date.format("%Y-%m-%d").to_string();
        let url = format!(
            "{}/v1/{}?access_key={}&base={}&symbols={}",
            self.base_url, day, self.access_key, base, quote
        );
        debug!("Requesting historical rate for {} from {}", day, self.base_url);

        let client = reqwest::Client::builder().user_agent("fxcast/1.0").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for {}{} on {}", e.without_url(), base, quote, day))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for {}{} on {}",
                response.status(),
                base,
                quote,
                day
            ));
        }

        let text = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response for {}: {}", day, e.without_url()))?;
        let data: HistoricalRatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", day, e))?;
        debug!(reported_date = ?data.date, "Parsed historical rates");

        let rate = data
            .rates
            .get(quote.as_str())
            .copied()
            .ok_or_else(|| anyhow!("No {} rate found for {}", quote, day))?;

        if !rate.is_finite() || rate <= 0.0 {
            return Err(anyhow!("Invalid {} rate {} for {}", quote, rate, day));
        }
        Ok(rate)
    }
}
