//! Dashboard analytics endpoints

use crate::analytics::*;
use crate::api::extract::AppQuery;
use crate::api::AppState;
use crate::error::Result;
use crate::models::WasteCategory;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

pub async fn summary(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<DateRangeQuery>,
) -> Result<Json<SummaryStatistics>> {
    let stats = state
        .analytics
        .summary(params.start_date, params.end_date)
        .await?;
    Ok(Json(stats))
}

fn default_days() -> u32 {
    30
}

#[derive(Debug, Deserialize)]
pub struct TimeSeriesQuery {
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default)]
    pub group_by: AggregationPeriod,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimeSeriesResponse {
    pub data: Vec<PeriodCount>,
    pub group_by: AggregationPeriod,
    pub days: u32,
}

pub async fn time_series(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<TimeSeriesQuery>,
) -> Result<Json<TimeSeriesResponse>> {
    let data = state
        .analytics
        .time_series(params.days, params.group_by)
        .await?;

    Ok(Json(TimeSeriesResponse {
        data,
        group_by: params.group_by,
        days: params.days,
    }))
}

#[derive(Debug, Deserialize)]
pub struct DaysQuery {
    #[serde(default = "default_days")]
    pub days: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WasteTypeTrendsResponse {
    pub trends: BTreeMap<WasteCategory, Vec<DateCount>>,
    pub days: u32,
}

pub async fn waste_type_trends(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<DaysQuery>,
) -> Result<Json<WasteTypeTrendsResponse>> {
    let trends = state.analytics.waste_type_trends(params.days).await?;
    Ok(Json(WasteTypeTrendsResponse {
        trends,
        days: params.days,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HeatmapResponse {
    pub data: Vec<HeatmapPoint>,
    pub total_points: usize,
}

pub async fn heatmap(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<DateRangeQuery>,
) -> Result<Json<HeatmapResponse>> {
    let data = state
        .analytics
        .heatmap(params.start_date, params.end_date)
        .await?;

    Ok(Json(HeatmapResponse {
        total_points: data.len(),
        data,
    }))
}

fn default_multiplier() -> f64 {
    2.0
}

#[derive(Debug, Deserialize)]
pub struct AnomalyQuery {
    #[serde(default = "default_multiplier")]
    pub threshold_multiplier: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnomalyResponse {
    pub anomalies: Vec<Anomaly>,
    pub total_anomalies: usize,
}

pub async fn anomalies(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AnomalyQuery>,
) -> Result<Json<AnomalyResponse>> {
    let anomalies = state
        .analytics
        .detect_anomalies(params.threshold_multiplier)
        .await?;

    Ok(Json(AnomalyResponse {
        total_anomalies: anomalies.len(),
        anomalies,
    }))
}

fn default_keyword_limit() -> usize {
    20
}

#[derive(Debug, Deserialize)]
pub struct KeywordQuery {
    #[serde(default = "default_keyword_limit")]
    pub limit: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct KeywordFrequencyResponse {
    pub keywords: Vec<KeywordCount>,
    pub total_keywords: usize,
}

pub async fn keywords(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<KeywordQuery>,
) -> Result<Json<KeywordFrequencyResponse>> {
    let keywords = state.analytics.keyword_frequency(params.limit).await?;

    Ok(Json(KeywordFrequencyResponse {
        total_keywords: keywords.len(),
        keywords,
    }))
}

/// Rising, falling and new waste categories
pub async fn trends(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<DaysQuery>,
) -> Result<Json<TrendAnalysis>> {
    let trends = state.analytics.analyze_trends(params.days).await?;
    Ok(Json(trends))
}

fn default_summary_days() -> u32 {
    7
}

#[derive(Debug, Deserialize)]
pub struct AdminSummaryQuery {
    #[serde(default = "default_summary_days")]
    pub days: u32,
}

/// Generated insights and executive paragraph for administrators
pub async fn admin_summary(
    State(state): State<AppState>,
    AppQuery(params): AppQuery<AdminSummaryQuery>,
) -> Result<Json<AdminSummary>> {
    let summary = state.analytics.admin_summary(params.days).await?;
    Ok(Json(summary))
}
