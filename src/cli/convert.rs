use super::{OutputFormat, print_json, ui};
use crate::core::currency::currency_info;
use crate::core::{Conversion, ConversionProvider, Currency, CurrencyCode};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub origin: Currency,
    pub destination: Currency,
    pub rate: f64,
    pub amount: f64,
    pub converted_amount: f64,
    pub timestamp: DateTime<Utc>,
    pub rates_source: String,
}

impl ConversionReport {
    pub fn from_conversion(
        origin: &CurrencyCode,
        destination: &CurrencyCode,
        amount: f64,
        conversion: Conversion,
    ) -> Result<Self> {
        Ok(ConversionReport {
            origin: currency_info(origin)?,
            destination: currency_info(destination)?,
            rate: conversion.rate,
            amount,
            converted_amount: conversion.converted_amount,
            timestamp: Utc::now(),
            rates_source: conversion.source,
        })
    }

    pub fn summary_line(&self) -> String {
        format!(
            "{:.2} {} = {} {}",
            self.amount,
            self.origin.code,
            ui::style_text(
                &format!("{:.2}", self.converted_amount),
                ui::StyleType::TotalValue
            ),
            self.destination.code
        )
    }

    pub fn rate_line(&self) -> String {
        ui::style_text(
            &format!(
                "Rate {:.6} ({}) via {}",
                self.rate, self.origin.country, self.rates_source
            ),
            ui::StyleType::Subtle,
        )
    }
}

pub async fn run(
    provider: &(dyn ConversionProvider + Send + Sync),
    origin: &CurrencyCode,
    destination: &CurrencyCode,
    amount: f64,
    format: OutputFormat,
) -> Result<()> {
    // Unknown codes fail before any request
    currency_info(origin)?;
    currency_info(destination)?;

    let conversion = provider.convert(origin, destination, amount).await?;
    let report = ConversionReport::from_conversion(origin, destination, amount, conversion)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!("{}", report.summary_line());
            println!("{}", report.rate_line());
        }
    }
    Ok(())
}
