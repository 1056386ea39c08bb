//! Analytics report types, serialized as the dashboard consumes them

use crate::models::WasteCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use strum::Display;

/// Echo of the requested window
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Period {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationCount {
    pub location: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryStatistics {
    pub total_incidents: u64,
    pub recent_incidents_7d: u64,
    pub waste_type_distribution: BTreeMap<WasteCategory, u64>,
    pub top_locations: Vec<LocationCount>,
    pub period: Period,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodCount {
    pub period: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeatmapPoint {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    pub count: u64,
}

/// Severity of a detected anomaly, trend or spike
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Medium,
    High,
}

/// A location whose count exceeds `mean * multiplier`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anomaly {
    pub location: String,
    pub count: u64,
    pub mean: f64,
    pub threshold: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
    New,
}

/// Change of one category between the previous and the current window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendItem {
    pub waste_type: WasteCategory,
    pub current_count: u64,
    pub previous_count: u64,
    pub change_percentage: f64,
    pub change_absolute: i64,
    pub trend: TrendDirection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
}

/// A category with no reports in the previous window
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewWasteType {
    pub waste_type: WasteCategory,
    pub count: u64,
    pub trend: TrendDirection,
}

/// A day whose count exceeds `mean + k * std_dev`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Spike {
    pub date: String,
    pub count: u64,
    pub mean: f64,
    pub threshold: f64,
    pub severity: Severity,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrendSummary {
    pub total_waste_types: usize,
    pub trending_up: usize,
    pub trending_down: usize,
    pub stable: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendAnalysis {
    pub period_days: u32,
    pub analysis_date: DateTime<Utc>,
    pub rising_trends: Vec<TrendItem>,
    pub falling_trends: Vec<TrendItem>,
    pub stable_trends: Vec<TrendItem>,
    pub new_waste_types: Vec<NewWasteType>,
    pub spikes: Vec<Spike>,
    pub summary: TrendSummary,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InsightKind {
    Overview,
    TrendRising,
    TrendFalling,
    NewCategory,
    Spike,
    Hotspot,
    DominantType,
    Keywords,
    Location,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InsightSeverity {
    Info,
    Success,
    Warning,
    Error,
}

/// One human-readable finding with its supporting data
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub severity: InsightSeverity,
    pub text: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminSummary {
    pub generated_at: DateTime<Utc>,
    pub period_days: u32,
    pub executive_summary: String,
    pub insights: Vec<Insight>,
    pub statistics: SummaryStatistics,
    pub trends: TrendAnalysis,
    pub anomalies: Vec<Anomaly>,
}
