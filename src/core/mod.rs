//! Core business logic: currency types, rate history and forecasting

pub mod cancel;
pub mod config;
pub mod currency;
pub mod error;
pub mod forecast;
pub mod history;
pub mod log;
pub mod pipeline;
pub mod rate_source;

// Re-export main types for cleaner imports
pub use cancel::CancelSignal;
pub use currency::{Conversion, ConversionProvider, Currency, CurrencyCode};
pub use error::{FailureReport, FxError, Stage};
pub use forecast::{ForecastEstimator, ForecastResult};
pub use history::{DateRange, HistoricalSeriesBuilder, HistorySettings, RatePoint, RateSeries};
pub use pipeline::{ForecastPipeline, PipelineOutput};
pub use rate_source::RateSource;
