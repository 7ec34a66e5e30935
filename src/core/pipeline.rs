//! Trailing-window forecast: fetch the days ending yesterday, then estimate.

use chrono::{Days, NaiveDate, Utc};
use tracing::info;

use super::cancel::CancelSignal;
use super::currency::CurrencyCode;
use super::error::{FxError, Stage};
use super::forecast::{ForecastEstimator, ForecastResult};
use super::history::{DateRange, HistoricalSeriesBuilder, HistorySettings, RatePoint, RateSeries};
use super::rate_source::RateSource;

pub const DEFAULT_WINDOW_DAYS: u64 = 5;

/// Forecast output together with the series it was derived from.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub series: RateSeries,
    pub forecast: ForecastResult,
}

/// Fetches the trailing window ending yesterday and estimates tomorrow's rate.
pub struct ForecastPipeline<'a> {
    source: &'a (dyn RateSource + Send + Sync),
    settings: HistorySettings,
    window_days: u64,
    today: Option<NaiveDate>,
    cancel: CancelSignal,
    progress: Option<&'a (dyn Fn(&RatePoint) + Send + Sync)>,
}

impl<'a> ForecastPipeline<'a> {
    pub fn new(source: &'a (dyn RateSource + Send + Sync), settings: HistorySettings) -> Self {
        ForecastPipeline {
            source,
            settings,
            window_days: DEFAULT_WINDOW_DAYS,
            today: None,
            cancel: CancelSignal::new(),
            progress: None,
        }
    }

    pub fn with_window_days(mut self, window_days: u64) -> Self {
        self.window_days = window_days;
        self
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: &'a (dyn Fn(&RatePoint) + Send + Sync)) -> Self {
        self.progress = Some(progress);
        self
    }

    /// `window_days` calendar days ending yesterday.
    pub fn trailing_window(&self, today: NaiveDate) -> DateRange {
        let end = today.checked_sub_days(Days::new(1)).unwrap_or(NaiveDate::MIN);
        let start = end
            .checked_sub_days(Days::new(self.window_days.saturating_sub(1)))
            .unwrap_or(NaiveDate::MIN);
        DateRange::new(start, end)
    }

    pub async fn forecast(
        &self,
        origin: &CurrencyCode,
        destination: &CurrencyCode,
    ) -> Result<ForecastResult, FxError> {
        Ok(self.run(origin, destination).await?.forecast)
    }

    /// Same as [`Self::forecast`] but keeps the fetched series.
    pub async fn run(
        &self,
        origin: &CurrencyCode,
        destination: &CurrencyCode,
    ) -> Result<PipelineOutput, FxError> {
        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let window = self.trailing_window(today);
        info!(%origin, %destination, start = %window.start, end = %window.end, "Running forecast");

        let mut builder = HistoricalSeriesBuilder::new(self.source, self.settings)
            .with_today(today)
            .with_cancel(self.cancel.clone());
        if let Some(progress) = self.progress {
            builder = builder.with_progress(progress);
        }

        let series = builder
            .build_series(origin, destination, window)
            .await
            .map_err(|e| e.in_stage(Stage::History))?;

        let forecast = ForecastEstimator::new()
            .with_today(today)
            .estimate(&series)
            .map_err(|e| e.in_stage(Stage::Estimate))?;

        info!(
            predicted_rate = forecast.predicted_rate,
            confidence = forecast.confidence,
            "Forecast ready"
        );
        Ok(PipelineOutput { series, forecast })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::tests::{StubSource, code, date};
    use std::time::Duration;

    fn settings() -> HistorySettings {
        HistorySettings {
            request_delay: Duration::ZERO,
            ..HistorySettings::default()
        }
    }

    #[tokio::test]
    async fn test_forecast_uses_five_days_ending_yesterday() {
        let source = StubSource::new(vec![1.08, 1.09, 1.10, 1.09, 1.11]);
        let pipeline = ForecastPipeline::new(&source, settings()).with_today(date("2024-03-15"));

        let output = pipeline.run(&code("EUR"), &code("USD")).await.unwrap();

        assert_eq!(
            source.requested_dates(),
            vec![
                date("2024-03-10"),
                date("2024-03-11"),
                date("2024-03-12"),
                date("2024-03-13"),
                date("2024-03-14"),
            ]
        );
        assert_eq!(output.series.len(), 5);
        assert_eq!(output.forecast.predicted_date, date("2024-03-16"));
        assert_eq!(output.forecast.source, "stub");
        assert!((output.forecast.trailing_average - 1.094).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_wrapped_with_stage() {
        let mut source = StubSource::new(vec![1.0]);
        source.fail_on = Some(date("2024-03-12"));
        let pipeline = ForecastPipeline::new(&source, settings()).with_today(date("2024-03-15"));

        let err = pipeline.forecast(&code("EUR"), &code("USD")).await.unwrap_err();

        assert!(matches!(
            err,
            FxError::Stage {
                stage: Stage::History,
                ..
            }
        ));
        assert!(matches!(err.root(), FxError::SeriesFetch { date: d, .. } if *d == date("2024-03-12")));
        assert_eq!(err.code(), "FETCH_FAILED");
    }

    #[tokio::test]
    async fn test_short_window_fails_in_estimate_stage() {
        let source = StubSource::new(vec![1.0]);
        let pipeline = ForecastPipeline::new(&source, settings())
            .with_today(date("2024-03-15"))
            .with_window_days(2);

        let err = pipeline.forecast(&code("EUR"), &code("USD")).await.unwrap_err();

        assert!(matches!(
            err,
            FxError::Stage {
                stage: Stage::Estimate,
                ..
            }
        ));
        assert!(matches!(
            err.root(),
            FxError::InsufficientData {
                required: 3,
                actual: 2
            }
        ));
        assert_eq!(source.requested_dates().len(), 2);
    }

    #[tokio::test]
    async fn test_window_wider_than_policy_is_rejected() {
        let source = StubSource::new(vec![1.0]);
        let pipeline = ForecastPipeline::new(&source, settings())
            .with_today(date("2024-03-15"))
            .with_window_days(7);

        let err = pipeline.forecast(&code("EUR"), &code("USD")).await.unwrap_err();
        assert!(matches!(err.root(), FxError::RangeTooWide { .. }));
        assert!(source.requested_dates().is_empty());
    }

    #[test]
    fn test_trailing_window_bounds() {
        let source = StubSource::new(vec![1.0]);
        let pipeline = ForecastPipeline::new(&source, settings());
        let window = pipeline.trailing_window(date("2024-03-01"));
        assert_eq!(window.start, date("2024-02-25"));
        assert_eq!(window.end, date("2024-02-29"));
        assert_eq!(window.span_days(), 4);
    }
}
