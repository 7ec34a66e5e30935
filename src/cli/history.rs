use super::{OutputFormat, print_json, ui};
use crate::core::currency::currency_info;
use crate::core::{
    CancelSignal, Currency, CurrencyCode, DateRange, HistoricalSeriesBuilder, HistorySettings,
    RatePoint, RateSeries, RateSource,
};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use comfy_table::Cell;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub origin: Currency,
    pub destination: Currency,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub rates: Vec<RatePoint>,
    pub timestamp: DateTime<Utc>,
    pub rates_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Notice shown when the rates are quoted against another base than requested.
pub fn substitution_notice(series: &RateSeries) -> Option<String> {
    series.is_base_substituted().then(|| {
        format!(
            "{} only quotes against {}, rates are {}/{} instead of {}/{}",
            series.source,
            series.base,
            series.base,
            series.quote,
            series.requested_base,
            series.quote
        )
    })
}

impl HistoryReport {
    pub fn from_series(series: RateSeries, range: DateRange) -> Result<Self> {
        Ok(HistoryReport {
            origin: currency_info(&series.base)?,
            destination: currency_info(&series.quote)?,
            start_date: range.start,
            end_date: range.end,
            message: substitution_notice(&series),
            rates: series.points,
            timestamp: Utc::now(),
            rates_source: series.source,
        })
    }

    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell("Date"),
            ui::header_cell(&format!(
                "Rate ({}/{})",
                self.origin.code, self.destination.code
            )),
            ui::header_cell("Change"),
        ]);

        let mut previous: Option<f64> = None;
        for point in &self.rates {
            let change = match previous {
                Some(prev) if prev > 0.0 => ui::change_cell((point.rate - prev) / prev * 100.0),
                _ => ui::na_cell(),
            };
            table.add_row(vec![
                Cell::new(point.date.format("%Y-%m-%d").to_string()),
                ui::number_cell(format!("{:.6}", point.rate)),
                change,
            ]);
            previous = Some(point.rate);
        }

        table.to_string()
    }
}

pub async fn run(
    source: &(dyn RateSource + Send + Sync),
    settings: HistorySettings,
    cancel: CancelSignal,
    origin: &CurrencyCode,
    destination: &CurrencyCode,
    range: DateRange,
    format: OutputFormat,
) -> Result<()> {
    // Unknown codes fail before any request
    currency_info(origin)?;
    currency_info(destination)?;

    let pb = ui::new_progress_bar(range.span_days().max(0) as u64 + 1, true);
    pb.set_message(format!("{origin}/{destination}"));
    let on_point = |point: &RatePoint| {
        pb.set_message(point.date.to_string());
        pb.inc(1);
    };

    let result = HistoricalSeriesBuilder::new(source, settings)
        .with_cancel(cancel)
        .with_progress(&on_point)
        .build_series(origin, destination, range)
        .await;
    pb.finish_and_clear();

    let report = HistoryReport::from_series(result?, range)?;
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!(
                "\n{} {} → {}",
                ui::style_text("Daily rates", ui::StyleType::Title),
                report.origin.code,
                report.destination.code
            );
            if let Some(message) = &report.message {
                println!("{}", ui::style_text(message, ui::StyleType::Warning));
            }
            println!("{}", report.display_as_table());
            println!(
                "{}",
                ui::style_text(
                    &format!("Source: {}", report.rates_source),
                    ui::StyleType::Subtle
                )
            );
        }
    }
    Ok(())
}
