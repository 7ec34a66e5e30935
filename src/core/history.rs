//! Validated, rate-limited retrieval of a daily rate series.
//!
//! A [`HistoricalSeriesBuilder`] checks a [`DateRange`] against the range
//! policy and then walks it one calendar day at a time, asking the
//! [`RateSource`] for each day in ascending order. Consecutive requests are
//! separated by a fixed delay that keeps us under the provider's rate limit,
//! so the walk is strictly sequential. Any failed day aborts the whole series.

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::cancel::CancelSignal;
use super::currency::CurrencyCode;
use super::error::FxError;
use super::rate_source::RateSource;

pub const MAX_SPAN_DAYS: i64 = 5;
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(1);

/// Inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Parses both bounds from `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .with_context(|| format!("Invalid start date '{start}'. Use YYYY-MM-DD"))?;
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .with_context(|| format!("Invalid end date '{end}'. Use YYYY-MM-DD"))?;
        Ok(DateRange { start, end })
    }

    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// Every calendar day from `start` to `end`, ascending. Empty when inverted.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }

    pub fn validate(&self, today: NaiveDate, max_span_days: i64) -> Result<(), FxError> {
        let future = self.start > today || self.end > today;
        let inverted = self.start > self.end;
        let too_wide = self.span_days() > max_span_days;

        if future {
            Err(FxError::FutureDate {
                start: self.start,
                end: self.end,
                today,
            })
        } else if inverted {
            Err(FxError::InvertedRange {
                start: self.start,
                end: self.end,
            })
        } else if too_wide {
            Err(FxError::RangeTooWide {
                span_days: self.span_days(),
                max_days: max_span_days,
            })
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub rate: f64,
}

/// Gap-free series of daily rates in ascending date order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSeries {
    /// Base the caller asked for.
    pub requested_base: CurrencyCode,
    /// Base the rates are actually quoted against.
    pub base: CurrencyCode,
    pub quote: CurrencyCode,
    pub points: Vec<RatePoint>,
    pub source: String,
}

impl RateSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn rates(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.rate).collect()
    }

    pub fn is_base_substituted(&self) -> bool {
        self.requested_base != self.base
    }
}

/// What to do when the caller's origin differs from the only base a source serves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasePolicy {
    /// Use the source's base instead and record the swap on the series.
    #[default]
    Substitute,
    /// Fail with `UnsupportedBase` before any request.
    Reject,
}

/// Tunables for a series walk. The span limit is fixed at [`MAX_SPAN_DAYS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySettings {
    pub request_delay: Duration,
    pub base_policy: BasePolicy,
}

impl Default for HistorySettings {
    fn default() -> Self {
        HistorySettings {
            request_delay: DEFAULT_REQUEST_DELAY,
            base_policy: BasePolicy::default(),
        }
    }
}

type ProgressFn<'a> = &'a (dyn Fn(&RatePoint) + Send + Sync);

pub struct HistoricalSeriesBuilder<'a> {
    source: &'a (dyn RateSource + Send + Sync),
    settings: HistorySettings,
    today: Option<NaiveDate>,
    cancel: CancelSignal,
    progress: Option<ProgressFn<'a>>,
}

impl<'a> HistoricalSeriesBuilder<'a> {
    pub fn new(source: &'a (dyn RateSource + Send + Sync), settings: HistorySettings) -> Self {
        HistoricalSeriesBuilder {
            source,
            settings,
            today: None,
            cancel: CancelSignal::new(),
            progress: None,
        }
    }

    /// Pins "today" instead of reading the UTC clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = cancel;
        self
    }

    /// Called after every successfully fetched day.
    pub fn with_progress(mut self, progress: ProgressFn<'a>) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub async fn build_series(
        &self,
        origin: &CurrencyCode,
        destination: &CurrencyCode,
        range: DateRange,
    ) -> Result<RateSeries, FxError> {
        range.validate(self.today(), MAX_SPAN_DAYS)?;
        let base = self.resolve_base(origin)?;

        info!(
            %base, %destination, start = %range.start, end = %range.end,
            "Building rate series from {}", self.source.label()
        );

        let mut points = Vec::with_capacity(range.span_days() as usize + 1);
        for (index, date) in range.days().enumerate() {
            if index > 0 {
                self.pause_before(date).await?;
            }
            if self.cancel.is_cancelled() {
                return Err(FxError::Cancelled { date });
            }

            let rate = self.fetch_day(&base, destination, date).await?;
            debug!(%date, rate, "Fetched daily rate");

            let point = RatePoint { date, rate };
            if let Some(progress) = self.progress {
                progress(&point);
            }
            points.push(point);
        }

        Ok(RateSeries {
            requested_base: origin.clone(),
            base,
            quote: destination.clone(),
            points,
            source: self.source.label().to_string(),
        })
    }

    fn resolve_base(&self, origin: &CurrencyCode) -> Result<CurrencyCode, FxError> {
        match self.source.supported_base() {
            Some(supported) if supported != origin => match self.settings.base_policy {
                BasePolicy::Reject => Err(FxError::UnsupportedBase {
                    requested: origin.clone(),
                    supported: supported.clone(),
                }),
                BasePolicy::Substitute => {
                    warn!(
                        requested = %origin, substituted = %supported,
                        "Rate source only serves one base currency, substituting it"
                    );
                    Ok(supported.clone())
                }
            },
            _ => Ok(origin.clone()),
        }
    }

    // An in-flight request is dropped as soon as the signal trips
    async fn fetch_day(
        &self,
        base: &CurrencyCode,
        destination: &CurrencyCode,
        date: NaiveDate,
    ) -> Result<f64, FxError> {
        tokio::select! {
            rate = self.source.fetch_daily_rate(base, destination, date) => {
                rate.map_err(|source| FxError::SeriesFetch { date, source })
            }
            _ = self.cancel.cancelled() => Err(FxError::Cancelled { date }),
        }
    }

    async fn pause_before(&self, date: NaiveDate) -> Result<(), FxError> {
        tokio::select! {
            _ = tokio::time::sleep(self.settings.request_delay) => Ok(()),
            _ = self.cancel.cancelled() => Err(FxError::Cancelled { date }),
        }
    }
}
