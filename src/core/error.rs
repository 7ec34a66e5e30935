//! Failure kinds produced by the history and forecast pipeline.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

use super::currency::CurrencyCode;

/// Pipeline stage a wrapped failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    History,
    Estimate,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::History => "history",
            Stage::Estimate => "estimate",
        })
    }
}

#[derive(Debug, Error)]
pub enum FxError {
    #[error("the start date {start} and end date {end} must not be later than the current date {today}")]
    FutureDate {
        start: NaiveDate,
        end: NaiveDate,
        today: NaiveDate,
    },

    #[error("the start date {start} must not be later than the end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("the range spans {span_days} days, at most {max_days} are allowed")]
    RangeTooWide { span_days: i64, max_days: i64 },

    #[error("failed to fetch the rate for {date}: {source:#}")]
    SeriesFetch {
        date: NaiveDate,
        #[source]
        source: anyhow::Error,
    },

    #[error("insufficient historical data for forecast (need at least {required} days, got {actual})")]
    InsufficientData { required: usize, actual: usize },

    #[error("first half of the series averages to zero, trend is undefined")]
    DegenerateTrend,

    #[error("the rate source only serves base {supported}, {requested} was requested")]
    UnsupportedBase {
        requested: CurrencyCode,
        supported: CurrencyCode,
    },

    #[error("currency must be a 3-letter alphabetic ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("currency code {code} not found")]
    UnknownCurrency { code: String },

    #[error("origin currency {origin} not supported")]
    UnsupportedOrigin { origin: CurrencyCode },

    #[error("series retrieval cancelled before {date}")]
    Cancelled { date: NaiveDate },

    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<FxError>,
    },
}

impl FxError {
    pub fn in_stage(self, stage: Stage) -> Self {
        FxError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost failure, skipping stage wrappers.
    pub fn root(&self) -> &FxError {
        match self {
            FxError::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stable machine-readable tag for the failure kind.
    pub fn code(&self) -> &'static str {
        match self {
            FxError::Stage { source, .. } => source.code(),
            FxError::FutureDate { .. } => "FUTURE_DATE",
            FxError::InvertedRange { .. } => "INVERTED_RANGE",
            FxError::RangeTooWide { .. } => "RANGE_TOO_WIDE",
            FxError::SeriesFetch { .. } => "FETCH_FAILED",
            FxError::InsufficientData { .. } => "INSUFFICIENT_DATA",
            FxError::DegenerateTrend => "DEGENERATE_TREND",
            FxError::UnsupportedBase { .. } => "UNSUPPORTED_BASE",
            FxError::InvalidCurrency { .. } => "INVALID_CURRENCY",
            FxError::UnknownCurrency { .. } => "UNKNOWN_CURRENCY",
            FxError::UnsupportedOrigin { .. } => "NO_DESTINATIONS",
            FxError::Cancelled { .. } => "CANCELLED",
        }
    }

    /// HTTP-equivalent status for the failure kind.
    pub fn status_code(&self) -> u16 {
        match self {
            FxError::Stage { source, .. } => source.status_code(),
            FxError::FutureDate { .. }
            | FxError::InvertedRange { .. }
            | FxError::RangeTooWide { .. }
            | FxError::UnsupportedBase { .. }
            | FxError::InvalidCurrency { .. } => 400,
            FxError::UnknownCurrency { .. } | FxError::UnsupportedOrigin { .. } => 404,
            FxError::SeriesFetch { .. }
            | FxError::InsufficientData { .. }
            | FxError::DegenerateTrend => 422,
            FxError::Cancelled { .. } => 499,
        }
    }

    pub fn report(&self) -> FailureReport {
        FailureReport {
            error: self.to_string(),
            code: self.code(),
            status: self.status_code(),
        }
    }
}

/// Tagged failure handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub error: String,
    pub code: &'static str,
    pub status: u16,
}
