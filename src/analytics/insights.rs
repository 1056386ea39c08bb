//! Natural-language findings for the admin summary

use crate::analytics::models::*;
use crate::models::WasteCategory;
use serde_json::json;

/// Render a float the way a dashboard user expects: `2.0`, `2.33`
fn display_float(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Most frequent category, first in category order on ties
fn dominant_type(statistics: &SummaryStatistics) -> Option<(WasteCategory, u64)> {
    statistics
        .waste_type_distribution
        .iter()
        .fold(None, |best: Option<(WasteCategory, u64)>, (&wt, &count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((wt, count)),
        })
}

pub fn generate_insights(
    days: u32,
    statistics: &SummaryStatistics,
    trends: &TrendAnalysis,
    anomalies: &[Anomaly],
    keywords: &[KeywordCount],
) -> Vec<Insight> {
    let mut insights = Vec::new();
    let total = statistics.total_incidents;

    if total > 0 {
        insights.push(Insight {
            kind: InsightKind::Overview,
            severity: InsightSeverity::Info,
            text: format!(
                "📊 {} incident{} reported in the last {} days",
                total,
                if total != 1 { "s" } else { "" },
                days
            ),
            data: json!({ "count": total, "period_days": days }),
        });
    }

    if let Some(top) = trends.rising_trends.first() {
        insights.push(Insight {
            kind: InsightKind::TrendRising,
            severity: if top.severity == Some(Severity::High) {
                InsightSeverity::Warning
            } else {
                InsightSeverity::Info
            },
            text: format!(
                "📈 {} waste is rising: {:+.0}% increase ({} incidents, up from {})",
                top.waste_type.title(),
                top.change_percentage,
                top.current_count,
                top.previous_count
            ),
            data: json!(top),
        });
    }

    if let Some(top) = trends.falling_trends.first() {
        insights.push(Insight {
            kind: InsightKind::TrendFalling,
            severity: InsightSeverity::Success,
            text: format!(
                "📉 {} waste is declining: {:.0}% decrease (good progress!)",
                top.waste_type.title(),
                top.change_percentage
            ),
            data: json!(top),
        });
    }

    if !trends.new_waste_types.is_empty() {
        let names: Vec<&str> = trends
            .new_waste_types
            .iter()
            .map(|t| t.waste_type.as_str())
            .collect();
        insights.push(Insight {
            kind: InsightKind::NewCategory,
            severity: InsightSeverity::Info,
            text: format!(
                "🆕 New waste type{} detected: {}",
                if names.len() > 1 { "s" } else { "" },
                names.join(", ")
            ),
            data: json!(trends.new_waste_types),
        });
    }

    // most recent spike
    if let Some(spike) = trends.spikes.last() {
        insights.push(Insight {
            kind: InsightKind::Spike,
            severity: InsightSeverity::Warning,
            text: format!(
                "⚠️ Unusual activity spike detected on {}: {} incidents (normally {:.0})",
                spike.date, spike.count, spike.mean
            ),
            data: json!(spike),
        });
    }

    if let Some(hotspot) = anomalies.first() {
        insights.push(Insight {
            kind: InsightKind::Hotspot,
            severity: if hotspot.severity == Severity::High {
                InsightSeverity::Error
            } else {
                InsightSeverity::Warning
            },
            text: format!(
                "🔥 Hotspot alert: {} has {} incidents (well above average of {})",
                hotspot.location,
                hotspot.count,
                display_float(hotspot.mean)
            ),
            data: json!(hotspot),
        });
    }

    if let Some((waste_type, count)) = dominant_type(statistics) {
        let percentage = if total > 0 {
            count as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        insights.push(Insight {
            kind: InsightKind::DominantType,
            severity: InsightSeverity::Info,
            text: format!(
                "🏆 Most common waste type: {} ({} incidents, {:.0}% of total)",
                waste_type.title(),
                count,
                percentage
            ),
            data: json!({
                "waste_type": waste_type,
                "count": count,
                "percentage": (percentage * 10.0).round() / 10.0,
            }),
        });
    }

    if !keywords.is_empty() {
        let top: Vec<&str> = keywords.iter().take(5).map(|k| k.keyword.as_str()).collect();
        insights.push(Insight {
            kind: InsightKind::Keywords,
            severity: InsightSeverity::Info,
            text: format!("🔑 Common themes: {}", top.join(", ")),
            data: json!({ "keywords": top }),
        });
    }

    if let Some(location) = statistics.top_locations.first() {
        insights.push(Insight {
            kind: InsightKind::Location,
            severity: InsightSeverity::Info,
            text: format!(
                "📍 Most affected location: {} ({} incidents)",
                location.location, location.count
            ),
            data: json!(location),
        });
    }

    insights
}

/// One paragraph summarizing the period
pub fn executive_summary(
    days: u32,
    statistics: &SummaryStatistics,
    trends: &TrendAnalysis,
    anomalies: &[Anomaly],
) -> String {
    let total = statistics.total_incidents;
    let mut parts = vec![format!(
        "In the past {} days, {} waste incident{} reported",
        days,
        total,
        if total != 1 { "s were" } else { " was" }
    )];

    if let Some(top) = trends.rising_trends.first() {
        parts.push(format!(
            "with {} waste showing a significant increase of {:+.0}%",
            top.waste_type, top.change_percentage
        ));
    }

    if let Some(hotspot) = anomalies.first() {
        parts.push(format!(
            "A hotspot was identified at {} with {} incidents",
            hotspot.location, hotspot.count
        ));
    }

    if let Some((waste_type, count)) = dominant_type(statistics) {
        parts.push(format!(
            "{} waste remains the most common type with {} incidents",
            waste_type.title(),
            count
        ));
    }

    if let Some(top) = trends.falling_trends.first() {
        parts.push(format!(
            "while {} waste has decreased by {:.0}%",
            top.waste_type,
            top.change_percentage.abs()
        ));
    }

    format!("{}.", parts.join(". "))
}
