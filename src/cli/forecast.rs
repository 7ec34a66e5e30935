use super::history::substitution_notice;
use super::{OutputFormat, print_json, ui};
use crate::core::currency::currency_info;
use crate::core::{
    CancelSignal, Currency, CurrencyCode, ForecastPipeline, HistorySettings, PipelineOutput,
    RatePoint, RateSource,
};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use comfy_table::Cell;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TrailingWindow {
    pub days: usize,
    pub average: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub origin: Currency,
    pub destination: Currency,
    pub predicted_date: NaiveDate,
    pub predicted_rate: f64,
    pub confidence: f64,
    pub trailing_window: TrailingWindow,
    pub timestamp: DateTime<Utc>,
    pub rates_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ForecastReport {
    pub fn from_output(output: PipelineOutput) -> Result<Self> {
        let PipelineOutput { series, forecast } = output;
        Ok(ForecastReport {
            origin: currency_info(&series.base)?,
            destination: currency_info(&series.quote)?,
            predicted_date: forecast.predicted_date,
            predicted_rate: forecast.predicted_rate,
            confidence: forecast.confidence,
            trailing_window: TrailingWindow {
                days: series.len(),
                average: forecast.trailing_average,
            },
            timestamp: Utc::now(),
            message: substitution_notice(&series),
            rates_source: forecast.source,
        })
    }

    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.set_header(vec![ui::header_cell("Metric"), ui::header_cell("Value")]);

        table.add_row(vec![
            ui::label_cell("Predicted date"),
            Cell::new(self.predicted_date.format("%Y-%m-%d").to_string()),
        ]);
        table.add_row(vec![
            ui::label_cell("Predicted rate"),
            ui::number_cell(format!("{:.6}", self.predicted_rate)),
        ]);
        table.add_row(vec![
            ui::label_cell("Confidence"),
            ui::number_cell(format!("{:.0}%", self.confidence * 100.0)),
        ]);
        table.add_row(vec![
            ui::label_cell(&format!("{}-day average", self.trailing_window.days)),
            ui::number_cell(format!("{:.6}", self.trailing_window.average)),
        ]);

        table.to_string()
    }
}

pub async fn run(
    source: &(dyn RateSource + Send + Sync),
    settings: HistorySettings,
    window_days: u64,
    cancel: CancelSignal,
    origin: &CurrencyCode,
    destination: &CurrencyCode,
    format: OutputFormat,
) -> Result<()> {
    currency_info(origin)?;
    currency_info(destination)?;

    let pb = ui::new_progress_bar(window_days, true);
    pb.set_message(format!("{origin}/{destination}"));
    let on_point = |point: &RatePoint| {
        pb.set_message(point.date.to_string());
        pb.inc(1);
    };

    let result = ForecastPipeline::new(source, settings)
        .with_window_days(window_days)
        .with_cancel(cancel)
        .with_progress(&on_point)
        .run(origin, destination)
        .await;
    pb.finish_and_clear();

    let report = ForecastReport::from_output(result?)?;
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            println!(
                "\n{} {} → {}",
                ui::style_text("Forecast", ui::StyleType::Title),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::tests::{code, date};
    use crate::core::{ForecastResult, RateSeries};

    #[test]
    fn test_report_from_output() {
        let output = PipelineOutput {
            series: RateSeries {
                requested_base: code("EUR"),
                base: code("EUR"),
                quote: code("USD"),
                points: date("2024-03-10")
                    .iter_days()
                    .take(5)
                    .map(|date| RatePoint { date, rate: 1.08 })
                    .collect(),
                source: "api.exchangeratesapi.io".to_string(),
            },
            forecast: ForecastResult {
                predicted_date: date("2024-03-16"),
                predicted_rate: 1.08,
                confidence: 0.9,
                trailing_average: 1.08,
                source: "api.exchangeratesapi.io".to_string(),
            },
        };

        let report = ForecastReport::from_output(output).unwrap();
        assert_eq!(report.destination.country, "United States");
        assert_eq!(report.trailing_window.days, 5);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["predicted_date"], "2024-03-16");
        assert_eq!(json["confidence"], 0.9);
        assert_eq!(json["trailing_window"]["average"], 1.08);
        assert_eq!(json["rates_source"], "api.exchangeratesapi.io");

        let table = report.display_as_table();
        assert!(table.contains("90%"));
        assert!(table.contains("5-day average"));
    }
}
