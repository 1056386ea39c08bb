//! Analytics engine: dashboard statistics, trends, spikes and hotspots
//! computed over the stored incidents.

use crate::analytics::aggregation::{AggregationPeriod, MetricsAggregator};
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::insights;
use crate::analytics::models::*;
use crate::analytics::statistics::{percent_change, round_to, Distribution};
use crate::models::{Incident, WasteCategory};
use crate::state::IncidentStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::info;

/// Thresholds used by the detectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Locations returned in summary statistics
    pub top_locations: usize,

    /// Percent change beyond which a category is rising or falling
    pub trend_change_pct: f64,

    /// Percent change beyond which a trend is `high` severity
    pub high_trend_change_pct: f64,

    /// Look-back window for daily spikes
    pub spike_window_days: i64,

    /// Standard deviations above the mean for a spike
    pub spike_sigma: f64,

    /// Standard deviations above the mean for a `high` spike
    pub high_spike_sigma: f64,

    /// Minimum days with reports before spikes are evaluated
    pub spike_min_days: usize,

    /// Hotspot multiplier used by the admin summary
    pub hotspot_multiplier: f64,

    /// Keywords considered by the admin summary
    pub summary_keyword_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            top_locations: 10,
            trend_change_pct: 20.0,
            high_trend_change_pct: 50.0,
            spike_window_days: 7,
            spike_sigma: 2.5,
            high_spike_sigma: 4.0,
            spike_min_days: 3,
            hotspot_multiplier: 2.0,
            summary_keyword_limit: 10,
        }
    }
}

/// Main analytics engine
///
/// The async methods validate their parameters, load the incidents and
/// delegate to the `compute_*` methods, which are pure over a slice and an
/// explicit `now`.
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    store: Arc<dyn IncidentStore>,
}

fn check_range<T: PartialOrd + std::fmt::Display + Copy>(
    name: &str,
    value: T,
    min: T,
    max: T,
) -> AnalyticsResult<()> {
    // NaN is outside every range
    if !(min..=max).contains(&value) {
        return Err(AnalyticsError::InvalidParameter(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}

fn check_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> AnalyticsResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AnalyticsError::InvalidDateRange(
                "start_date must not be after end_date".to_string(),
            ));
        }
    }
    Ok(())
}

impl AnalyticsEngine {
    pub fn new(store: Arc<dyn IncidentStore>, config: AnalyticsConfig) -> Self {
        Self { config, store }
    }

    /// Create with default thresholds
    pub fn with_defaults(store: Arc<dyn IncidentStore>) -> Self {
        Self::new(store, AnalyticsConfig::default())
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    async fn load(&self) -> AnalyticsResult<Vec<Incident>> {
        Ok(self.store.all_incidents().await?)
    }

    pub async fn summary(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AnalyticsResult<SummaryStatistics> {
        check_window(start, end)?;
        let incidents = self.load().await?;
        Ok(self.compute_summary(&incidents, start, end, Utc::now()))
    }

    pub async fn time_series(
        &self,
        days: u32,
        group_by: AggregationPeriod,
    ) -> AnalyticsResult<Vec<PeriodCount>> {
        check_range("days", days, 1, 365)?;
        let incidents = self.load().await?;
        Ok(self.compute_time_series(&incidents, days, group_by, Utc::now()))
    }

    pub async fn waste_type_trends(
        &self,
        days: u32,
    ) -> AnalyticsResult<BTreeMap<WasteCategory, Vec<DateCount>>> {
        check_range("days", days, 1, 365)?;
        let incidents = self.load().await?;
        Ok(self.compute_waste_type_trends(&incidents, days, Utc::now()))
    }

    pub async fn heatmap(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AnalyticsResult<Vec<HeatmapPoint>> {
        check_window(start, end)?;
        let incidents = self.load().await?;
        Ok(self.compute_heatmap(&incidents, start, end))
    }

    pub async fn detect_anomalies(&self, multiplier: f64) -> AnalyticsResult<Vec<Anomaly>> {
        check_range("threshold_multiplier", multiplier, 1.0, 5.0)?;
        let incidents = self.load().await?;
        Ok(self.compute_anomalies(&incidents, multiplier))
    }

    pub async fn keyword_frequency(&self, limit: usize) -> AnalyticsResult<Vec<KeywordCount>> {
        check_range("limit", limit, 1, 100)?;
        let incidents = self.load().await?;
        Ok(self.compute_keyword_frequency(&incidents, limit))
    }

    pub async fn analyze_trends(&self, days: u32) -> AnalyticsResult<TrendAnalysis> {
        check_range("days", days, 7, 365)?;
        let incidents = self.load().await?;
        Ok(self.compute_trends(&incidents, days, Utc::now()))
    }

    pub async fn daily_spikes(&self, days: u32, sigma: f64) -> AnalyticsResult<Vec<Spike>> {
        check_range("days", days, 1, 365)?;
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(AnalyticsError::InvalidParameter(
                "spike threshold must be positive".to_string(),
            ));
        }
        let incidents = self.load().await?;
        Ok(self.compute_spikes(&incidents, days as i64, sigma, Utc::now()))
    }

    pub async fn admin_summary(&self, days: u32) -> AnalyticsResult<AdminSummary> {
        check_range("days", days, 1, 90)?;
        let incidents = self.load().await?;
        Ok(self.compute_admin_summary(&incidents, days, Utc::now()))
    }

    /// Totals, category distribution and busiest locations within a window
    pub fn compute_summary(
        &self,
        incidents: &[Incident],
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> SummaryStatistics {
        let in_range: Vec<&Incident> = MetricsAggregator::within(incidents, start, end).collect();

        let recent_since = now - Duration::days(7);
        let recent_incidents_7d = incidents
            .iter()
            .filter(|i| i.timestamp >= recent_since)
            .count() as u64;

        let waste_type_distribution =
            MetricsAggregator::count_by(in_range.iter().filter_map(|i| i.waste_type));

        let mut top_locations: Vec<LocationCount> =
            MetricsAggregator::count_by(in_range.iter().map(|i| i.location.as_str()))
                .into_iter()
                .map(|(location, count)| LocationCount {
                    location: location.to_string(),
                    count,
                })
                .collect();
        top_locations.sort_by(|a, b| b.count.cmp(&a.count));
        top_locations.truncate(self.config.top_locations);

        SummaryStatistics {
            total_incidents: in_range.len() as u64,
            recent_incidents_7d,
            waste_type_distribution,
            top_locations,
            period: Period {
                start_date: start,
                end_date: end,
            },
        }
    }

    /// Counts per bucket over the last `days`, oldest first
    pub fn compute_time_series(
        &self,
        incidents: &[Incident],
        days: u32,
        group_by: AggregationPeriod,
        now: DateTime<Utc>,
    ) -> Vec<PeriodCount> {
        let since = now - Duration::days(days as i64);
        MetricsAggregator::count_by_period(incidents.iter().filter(|i| i.timestamp >= since), group_by)
            .into_iter()
            .map(|(bucket, count)| PeriodCount {
                period: group_by.label(bucket),
                count,
            })
            .collect()
    }

    /// Per category, daily counts over the last `days`
    pub fn compute_waste_type_trends(
        &self,
        incidents: &[Incident],
        days: u32,
        now: DateTime<Utc>,
    ) -> BTreeMap<WasteCategory, Vec<DateCount>> {
        let since = now - Duration::days(days as i64);
        let daily = MetricsAggregator::count_by(
            incidents
                .iter()
                .filter(|i| i.timestamp >= since)
                .filter_map(|i| i.waste_type.map(|wt| (wt, i.timestamp.date_naive()))),
        );

        let mut trends: BTreeMap<WasteCategory, Vec<DateCount>> = BTreeMap::new();
        for ((waste_type, date), count) in daily {
            trends.entry(waste_type).or_default().push(DateCount {
                date: AggregationPeriod::Day.label(date),
                count,
            });
        }
        trends
    }

    /// Incidents with coordinates grouped by (location, latitude, longitude)
    pub fn compute_heatmap(
        &self,
        incidents: &[Incident],
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Vec<HeatmapPoint> {
        let points = MetricsAggregator::within(incidents, start, end).filter_map(|i| {
            match (i.latitude, i.longitude) {
                (Some(lat), Some(lon)) => Some((i.location.clone(), lat.to_bits(), lon.to_bits())),
                _ => None,
            }
        });

        MetricsAggregator::most_common(points, usize::MAX)
            .into_iter()
            .map(|((location, lat, lon), count)| HeatmapPoint {
                location,
                latitude: f64::from_bits(lat),
                longitude: f64::from_bits(lon),
                count,
            })
            .collect()
    }

    /// Locations whose count exceeds `mean * multiplier`, busiest first
    pub fn compute_anomalies(&self, incidents: &[Incident], multiplier: f64) -> Vec<Anomaly> {
        let per_location = MetricsAggregator::count_by(incidents.iter().map(|i| i.location.as_str()));
        let counts: Vec<u64> = per_location.values().copied().collect();

        let Ok(distribution) = Distribution::from_counts(&counts) else {
            return Vec::new();
        };
        let threshold = distribution.mean * multiplier;

        let mut anomalies: Vec<Anomaly> = per_location
            .into_iter()
            .filter(|(_, count)| *count as f64 > threshold)
            .map(|(location, count)| Anomaly {
                location: location.to_string(),
                count,
                mean: round_to(distribution.mean, 2),
                threshold: round_to(threshold, 2),
                severity: if count as f64 > threshold * 1.5 {
                    Severity::High
                } else {
                    Severity::Medium
                },
            })
            .collect();
        anomalies.sort_by(|a, b| b.count.cmp(&a.count));

        info!(count = anomalies.len(), multiplier, "Detected anomalous locations");
        anomalies
    }

    pub fn compute_keyword_frequency(&self, incidents: &[Incident], limit: usize) -> Vec<KeywordCount> {
        let keywords = incidents.iter().flat_map(|i| i.keywords.iter().map(String::as_str));

        MetricsAggregator::most_common(keywords, limit)
            .into_iter()
            .map(|(keyword, count)| KeywordCount {
                keyword: keyword.to_string(),
                count,
            })
            .collect()
    }

    /// Compare category counts of `[now - days, now]` with the window before it
    pub fn compute_trends(&self, incidents: &[Incident], days: u32, now: DateTime<Utc>) -> TrendAnalysis {
        let current_start = now - Duration::days(days as i64);
        let previous_start = current_start - Duration::days(days as i64);

        let current = MetricsAggregator::count_by(
            incidents
                .iter()
                .filter(|i| i.timestamp >= current_start && i.timestamp <= now)
                .filter_map(|i| i.waste_type),
        );
        let previous = MetricsAggregator::count_by(
            incidents
                .iter()
                .filter(|i| i.timestamp >= previous_start && i.timestamp < current_start)
                .filter_map(|i| i.waste_type),
        );

        let all_types: BTreeSet<WasteCategory> =
            current.keys().chain(previous.keys()).copied().collect();

        let mut rising = Vec::new();
        let mut falling = Vec::new();
        let mut stable = Vec::new();
        let mut new_types = Vec::new();

        for waste_type in &all_types {
            let cur = current.get(waste_type).copied().unwrap_or(0);
            let prev = previous.get(waste_type).copied().unwrap_or(0);

            let Some(change) = percent_change(cur, prev) else {
                if cur > 0 {
                    new_types.push(NewWasteType {
                        waste_type: *waste_type,
                        count: cur,
                        trend: TrendDirection::New,
                    });
                }
                continue;
            };

            let mut item = TrendItem {
                waste_type: *waste_type,
                current_count: cur,
                previous_count: prev,
                change_percentage: round_to(change, 1),
                change_absolute: cur as i64 - prev as i64,
                trend: TrendDirection::Stable,
                severity: None,
            };

            if change > self.config.trend_change_pct {
                item.trend = TrendDirection::Rising;
                item.severity = Some(if change > self.config.high_trend_change_pct {
                    Severity::High
                } else {
                    Severity::Medium
                });
                rising.push(item);
            } else if change < -self.config.trend_change_pct {
                item.trend = TrendDirection::Falling;
                item.severity = Some(if change < -self.config.high_trend_change_pct {
                    Severity::High
                } else {
                    Severity::Medium
                });
                falling.push(item);
            } else {
                stable.push(item);
            }
        }

        let by_magnitude =
            |a: &TrendItem, b: &TrendItem| b.change_percentage.abs().total_cmp(&a.change_percentage.abs());
        rising.sort_by(by_magnitude);
        falling.sort_by(by_magnitude);

        let spikes = self.compute_spikes(
            incidents,
            self.config.spike_window_days,
            self.config.spike_sigma,
            now,
        );

        info!(
            rising = rising.len(),
            falling = falling.len(),
            stable = stable.len(),
            new = new_types.len(),
            spikes = spikes.len(),
            "Trend analysis completed"
        );

        TrendAnalysis {
            period_days: days,
            analysis_date: now,
            summary: TrendSummary {
                total_waste_types: all_types.len(),
                trending_up: rising.len(),
                trending_down: falling.len(),
                stable: stable.len(),
            },
            rising_trends: rising,
            falling_trends: falling,
            stable_trends: stable,
            new_waste_types: new_types,
            spikes,
        }
    }

    /// Days within the last `days` whose count exceeds `mean + sigma * std_dev`
    pub fn compute_spikes(
        &self,
        incidents: &[Incident],
        days: i64,
        sigma: f64,
        now: DateTime<Utc>,
    ) -> Vec<Spike> {
        let since = now - Duration::days(days);
        let daily = MetricsAggregator::count_by_period(
            incidents.iter().filter(|i| i.timestamp >= since),
            AggregationPeriod::Day,
        );

        if daily.len() < self.config.spike_min_days {
            return Vec::new();
        }

        let counts: Vec<u64> = daily.values().copied().collect();
        let Ok(distribution) = Distribution::from_counts(&counts) else {
            return Vec::new();
        };
        let threshold = distribution.mean + sigma * distribution.std_dev;
        let high = distribution.mean + self.config.high_spike_sigma * distribution.std_dev;

        daily
            .into_iter()
            .filter(|(_, count)| *count as f64 > threshold)
            .map(|(date, count)| Spike {
                date: AggregationPeriod::Day.label(date),
                count,
                mean: round_to(distribution.mean, 1),
                threshold: round_to(threshold, 1),
                severity: if count as f64 > high {
                    Severity::High
                } else {
                    Severity::Medium
                },
            })
            .collect()
    }

    /// Insights and an executive paragraph for the last `days`
    pub fn compute_admin_summary(&self, incidents: &[Incident], days: u32, now: DateTime<Utc>) -> AdminSummary {
        let start = now - Duration::days(days as i64);

        let statistics = self.compute_summary(incidents, Some(start), Some(now), now);
        let trends = self.compute_trends(incidents, days, now);
        let anomalies = self.compute_anomalies(incidents, self.config.hotspot_multiplier);
        let keywords = self.compute_keyword_frequency(incidents, self.config.summary_keyword_limit);

        let insights = insights::generate_insights(days, &statistics, &trends, &anomalies, &keywords);
        let executive_summary = insights::executive_summary(days, &statistics, &trends, &anomalies);

        info!(insights = insights.len(), period_days = days, "Generated admin summary");

        AdminSummary {
            generated_at: now,
            period_days: days,
            executive_summary,
            insights,
            statistics,
            trends,
            anomalies,
        }
    }
}
