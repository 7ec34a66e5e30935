use super::{OutputFormat, print_json, ui};
use crate::core::currency::{currency_info, supported_destinations};
use crate::core::{Currency, CurrencyCode};
use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::Cell;
use serde::Serialize;

pub const SOURCE_LABEL: &str = "built-in";

#[derive(Debug, Clone, Serialize)]
pub struct DestinationsReport {
    pub origin: Currency,
    pub destinations: Vec<Currency>,
    pub timestamp: DateTime<Utc>,
    pub rates_source: String,
}

impl DestinationsReport {
    pub fn for_origin(origin: &CurrencyCode) -> Result<Self> {
        Ok(DestinationsReport {
            origin: currency_info(origin)?,
            destinations: supported_destinations(origin)?,
            timestamp: Utc::now(),
            rates_source: SOURCE_LABEL.to_string(),
        })
    }
}

pub fn run(origin: &CurrencyCode, format: OutputFormat) -> Result<()> {
    let report = DestinationsReport::for_origin(origin)?;

    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            let mut table = ui::new_styled_table();
            table.set_header(vec![ui::header_cell("Code"), ui::header_cell("Country")]);
            for currency in &report.destinations {
                table.add_row(vec![
                    Cell::new(currency.code.as_str()),
                    Cell::new(&currency.country),
                ]);
            }
            println!(
                "\n{} {} ({})",
                ui::style_text("Destinations from", ui::StyleType::Title),
                report.origin.code,
                report.origin.country
            );
            println!("{table}");
        }
    }
    Ok(())
}
