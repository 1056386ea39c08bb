//! Statistical helpers for trend, spike and hotspot detection

use crate::analytics::error::{AnalyticsError, AnalyticsResult};

/// Population statistics of a count series
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    pub mean: f64,
    /// Population standard deviation (divides by `n`)
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl Distribution {
    /// Calculate distribution from a dataset
    pub fn from_data(data: &[f64]) -> AnalyticsResult<Self> {
        if data.is_empty() {
            return Err(AnalyticsError::InvalidParameter(
                "Cannot calculate distribution from empty dataset".to_string(),
            ));
        }

        let count = data.len();
        let mean = data.iter().sum::<f64>() / count as f64;
        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count as f64;

        Ok(Self {
            mean,
            std_dev: variance.sqrt(),
            variance,
            min: data.iter().copied().fold(f64::INFINITY, f64::min),
            max: data.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            count,
        })
    }

    /// Same as [`Distribution::from_data`] over integer counts
    pub fn from_counts(counts: &[u64]) -> AnalyticsResult<Self> {
        let data: Vec<f64> = counts.iter().map(|&c| c as f64).collect();
        Self::from_data(&data)
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Relative change in percent. `None` when there is no baseline.
pub fn percent_change(current: u64, previous: u64) -> Option<f64> {
    if previous == 0 {
        return None;
    }
    Some((current as f64 - previous as f64) / previous as f64 * 100.0)
}
