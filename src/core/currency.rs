//! Currency codes, metadata lookup and spot conversion abstractions

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use super::error::FxError;

/// A 3-letter uppercase ISO currency code such as `EUR`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(value: &str) -> Result<Self, FxError> {
        let trimmed = value.trim();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(FxError::InvalidCurrency {
                value: value.to_string(),
            });
        }
        Ok(CurrencyCode(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = FxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurrencyCode::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = FxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CurrencyCode::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Currency code together with the country it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub code: CurrencyCode,
    pub country: String,
}

const KNOWN_CURRENCIES: &[(&str, &str)] = &[
    ("COP", "Colombia"),
    ("USD", "United States"),
    ("EUR", "Eurozone"),
];

const SUPPORTED_PAIRS: &[(&str, &[&str])] = &[("EUR", &["USD", "COP"])];

pub fn currency_info(code: &CurrencyCode) -> Result<Currency, FxError> {
    KNOWN_CURRENCIES
        .iter()
        .find(|(known, _)| *known == code.as_str())
        .map(|(_, country)| Currency {
            code: code.clone(),
            country: country.to_string(),
        })
        .ok_or_else(|| FxError::UnknownCurrency {
            code: code.to_string(),
        })
}

/// Destination currencies the historical rate source can quote against `origin`.
pub fn supported_destinations(origin: &CurrencyCode) -> Result<Vec<Currency>, FxError> {
    let (_, destinations) = SUPPORTED_PAIRS
        .iter()
        .find(|(base, _)| *base == origin.as_str())
        .ok_or_else(|| FxError::UnsupportedOrigin {
            origin: origin.clone(),
        })?;

    destinations
        .iter()
        .map(|code| currency_info(&CurrencyCode::parse(code)?))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub rate: f64,
    pub converted_amount: f64,
    pub source: String,
}

#[async_trait]
pub trait ConversionProvider: Send + Sync {
    async fn convert(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
        amount: f64,
    ) -> Result<Conversion>;
}
