//! Time bucketing and grouped counts over incidents

use crate::models::Incident;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use strum::{Display, EnumString};

/// Bucket width for time series
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AggregationPeriod {
    #[default]
    Day,
    Week,
    Month,
}

impl AggregationPeriod {
    /// First calendar day of the bucket containing `date`
    pub fn bucket_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            AggregationPeriod::Day => date,
            AggregationPeriod::Week => {
                date - Duration::days(date.weekday().num_days_from_monday() as i64)
            }
            AggregationPeriod::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// Label for a bucket: `YYYY-MM-DD` for days, midnight date-time otherwise
    pub fn label(&self, bucket: NaiveDate) -> String {
        match self {
            AggregationPeriod::Day => bucket.format("%Y-%m-%d").to_string(),
            AggregationPeriod::Week | AggregationPeriod::Month => {
                bucket.format("%Y-%m-%dT00:00:00").to_string()
            }
        }
    }
}

/// Aggregation helpers for incident data
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Incidents whose timestamp falls within the inclusive window
    pub fn within<'a>(
        incidents: &'a [Incident],
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = &'a Incident> + 'a {
        incidents.iter().filter(move |i| {
            start.map_or(true, |s| i.timestamp >= s) && end.map_or(true, |e| i.timestamp <= e)
        })
    }

    /// Counts per bucket, ascending by bucket
    pub fn count_by_period<'a>(
        incidents: impl IntoIterator<Item = &'a Incident>,
        period: AggregationPeriod,
    ) -> BTreeMap<NaiveDate, u64> {
        let mut buckets = BTreeMap::new();
        for incident in incidents {
            let bucket = period.bucket_start(incident.timestamp.date_naive());
            *buckets.entry(bucket).or_insert(0) += 1;
        }
        buckets
    }

    /// Occurrence counts of an ordered key
    pub fn count_by<K: Ord, I: IntoIterator<Item = K>>(keys: I) -> BTreeMap<K, u64> {
        let mut counts = BTreeMap::new();
        for key in keys {
            *counts.entry(key).or_insert(0) += 1;
        }
        counts
    }

    /// The `n` most frequent keys, ties broken by first occurrence
    pub fn most_common<K, I>(keys: I, n: usize) -> Vec<(K, u64)>
    where
        K: Eq + Hash + Clone,
        I: IntoIterator<Item = K>,
    {
        let mut index: HashMap<K, usize> = HashMap::new();
        let mut counts: Vec<(K, u64)> = Vec::new();

        for key in keys {
            match index.get(&key) {
                Some(&pos) => counts[pos].1 += 1,
                None => {
                    index.insert(key.clone(), counts.len());
                    counts.push((key, 1));
                }
            }
        }

        // stable: equal counts keep insertion order
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts.truncate(n);
        counts
    }
}
