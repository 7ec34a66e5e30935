//! Next-day rate estimate from a short trailing series.
use super::error::FxError;
use super::history::RateSeries;
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;

pub const MIN_SAMPLES: usize = 3;
const TREND_DAMPING: f64 = 0.5;
const BASE_CONFIDENCE: f64 = 0.5;
const MIN_CONFIDENCE: f64 = 0.3;
const MAX_CONFIDENCE: f64 = 0.9;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub predicted_date: NaiveDate,
    pub predicted_rate: f64,
    pub confidence: f64,
    pub trailing_average: f64,
    pub source: String,
}

/// Dispersion and trend figures of a rate sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub average: f64,
    pub std_dev: f64,
    pub first_half_average: f64,
    pub second_half_average: f64,
}

impl SeriesStats {
    /// Splits at `len / 2`, so odd lengths put the extra sample in the second half.
    pub fn compute(rates: &[f64]) -> Result<Self, FxError> {
        if rates.len() < MIN_SAMPLES {
            return Err(FxError::InsufficientData {
                required: MIN_SAMPLES,
                actual: rates.len(),
            });
        }

        let average = mean(rates);
        let variance = rates.iter().map(|r| (r - average).powi(2)).sum::<f64>() / rates.len() as f64;
        let (first, second) = rates.split_at(rates.len() / 2);

        Ok(SeriesStats {
            average,
            std_dev: variance.sqrt(),
            first_half_average: mean(first),
            second_half_average: mean(second),
        })
    }

    /// Relative change between the two half averages.
    pub fn trend(&self) -> Result<f64, FxError> {
        if self.first_half_average == 0.0 {
            return Err(FxError::DegenerateTrend);
        }
        Ok((self.second_half_average - self.first_half_average) / self.first_half_average)
    }

    /// Coefficient of variation, zero for a flat sample.
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.std_dev > 0.0 {
            self.std_dev / self.average
        } else {
            0.0
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn dispersion_bonus(cv: f64) -> f64 {
    if cv < 0.05 {
        0.3
    } else if cv < 0.10 {
        0.2
    } else if cv < 0.20 {
        0.1
    } else {
        0.0
    }
}

fn sample_size_bonus(len: usize) -> f64 {
    match len {
        n if n >= 5 => 0.1,
        4 => 0.05,
        _ => 0.0,
    }
}

pub fn confidence(stats: &SeriesStats, len: usize) -> f64 {
    let score = BASE_CONFIDENCE
        + dispersion_bonus(stats.coefficient_of_variation())
        + sample_size_bonus(len);
    score.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastEstimator {
    today: Option<NaiveDate>,
}

impl ForecastEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Damped linear extrapolation of `series` one day past today.
    pub fn estimate(&self, series: &RateSeries) -> Result<ForecastResult, FxError> {
        let rates = series.rates();
        let stats = SeriesStats::compute(&rates)?;
        let trend = stats.trend()?;

        let mut predicted_rate = stats.average + stats.average * trend * TREND_DAMPING;
        if predicted_rate <= 0.0 {
            predicted_rate = stats.average;
        }

        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        let predicted_date = today
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX);

        Ok(ForecastResult {
            predicted_date,
            predicted_rate,
            confidence: confidence(&stats, rates.len()),
            trailing_average: stats.average,
            source: series.source.clone(),
        })
    }
}
