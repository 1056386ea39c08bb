//! Dashboard analytics over stored incidents
//!
//! # Features
//!
//! - **Summary statistics**: totals, category distribution, busiest locations
//! - **Time series**: counts bucketed by day, week or month
//! - **Trend analysis**: current vs previous window per waste category
//! - **Spike and hotspot detection**: mean and standard-deviation thresholds
//! - **Admin summary**: natural-language insights and an executive paragraph

mod aggregation;
mod engine;
mod error;
mod insights;
mod models;
mod statistics;

pub use aggregation::{AggregationPeriod, MetricsAggregator};
pub use engine::{AnalyticsConfig, AnalyticsEngine};
pub use error::{AnalyticsError, AnalyticsResult};
pub use insights::{executive_summary, generate_insights};
pub use models::*;
pub use statistics::{percent_change, round_to, Distribution};
