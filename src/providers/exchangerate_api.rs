use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::core::{Conversion, ConversionProvider, CurrencyCode};

pub const SOURCE_LABEL: &str = "exchange-rate-api";

// Spot conversion through exchangerate-api.com pair endpoint
pub struct ExchangeRateApiProvider {
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        ExchangeRateApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PairConversionResponse {
    conversion_rate: f64,
    conversion_result: f64,
}

#[async_trait]
impl ConversionProvider for ExchangeRateApiProvider {
    async fn convert(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        amount: f64,
    ) -> Result<Conversion> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(anyhow!("Amount must be a positive number, got {}", amount));
        }

        let url = format!(
            "{}/v6/{}/pair/{}/{}/{:.3}",
            self.base_url, self.api_key, from, to, amount
        );
        debug!("Requesting conversion {}{} from {}", from, to, self.base_url);

        let client = reqwest::Client::builder().user_agent("fxcast/1.0").build()?;
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| {
                anyhow!(
                    "Request error: {} for currency pair: {}{}",
                    e.without_url(),
                    from,
                    to
                )
            })?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for currency pair: {}{}",
                response.status(),
                from,
                to
            ));
        }

        let text = response.text().await.map_err(|e| {
            anyhow!(
                "Failed to read response for currency pair: {}{}: {}",
                from,
                to,
                e.without_url()
            )
        })?;
        let data: PairConversionResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}{}: {}", from, to, e))?;

        Ok(Conversion {
            rate: data.conversion_rate,
            converted_amount: data.conversion_result,
            source: SOURCE_LABEL.to_string(),
        })
    }
}
