use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::EnvironmentalRecord;

/// Most recent environmental records sampled per aggregation pass. Older
/// activity falls outside the sample; that resolution limit is accepted.
pub const ENV_FETCH_LIMIT: usize = 100;

/// Calendar days covered by the trend window, ending today.
pub const TREND_WINDOW_DAYS: i64 = 7;

/// Severity label that drives the critical-alert counters.
const CRITICAL_LABEL: &str = "critical";

/// One calendar-day aggregation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendBucket {
    pub date_label: String,
    pub total_count: u64,
    pub critical_count: u64,
}

/// Buckets records into the 7 calendar days ending `today`, oldest first.
/// A record lands in a bucket when the UTC calendar date of `recorded_at`
/// matches the bucket's date; sparse days report zero counts.
pub fn trend_buckets(records: &[EnvironmentalRecord], today: NaiveDate) -> Vec<TrendBucket> {
    (0..TREND_WINDOW_DAYS)
        .rev()
        .map(|days_back| {
            let date = today - Duration::days(days_back);
            let day_records = records
                .iter()
                .filter(|record| record.recorded_at.date_naive() == date);

            let mut total_count = 0;
            let mut critical_count = 0;
            for record in day_records {
                total_count += 1;
                if record.severity_level == CRITICAL_LABEL {
                    critical_count += 1;
                }
            }

            TrendBucket {
                date_label: date.format("%b %-d").to_string(),
                total_count,
                critical_count,
            }
        })
        .collect()
}

/// Rolling analytics over the sampled records plus collection totals.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_records: u64,
    pub total_reports: u64,
    pub total_predictions: u64,
    pub critical_alerts: u64,
    /// Keyed by raw severity label; unknown labels show up as themselves.
    pub severity_breakdown: BTreeMap<String, u64>,
    pub category_breakdown: BTreeMap<String, u64>,
    pub trend: Vec<TrendBucket>,
}

pub fn build_snapshot(
    records: &[EnvironmentalRecord],
    report_count: u64,
    prediction_count: u64,
    today: NaiveDate,
) -> AnalyticsSnapshot {
    let mut severity_breakdown: BTreeMap<String, u64> = BTreeMap::new();
    let mut category_breakdown: BTreeMap<String, u64> = BTreeMap::new();
    let mut critical_alerts = 0;

    for record in records {
        *severity_breakdown
            .entry(record.severity_level.clone())
            .or_insert(0) += 1;
        *category_breakdown
            .entry(record.data_type.clone())
            .or_insert(0) += 1;
        if record.severity_level == CRITICAL_LABEL {
            critical_alerts += 1;
        }
    }

    AnalyticsSnapshot {
        total_records: records.len() as u64,
        total_reports: report_count,
        total_predictions: prediction_count,
        critical_alerts,
        severity_breakdown,
        category_breakdown,
        trend: trend_buckets(records, today),
    }
}

#[cfg(test)]
mod tests {
    use super::{build_snapshot, trend_buckets, TREND_WINDOW_DAYS};
    use crate::models::EnvironmentalRecord;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn record_on(date: NaiveDate, data_type: &str, severity: &str) -> EnvironmentalRecord {
        let recorded_at = Utc
            .from_utc_datetime(&date.and_hms_opt(12, 30, 0).expect("valid time"));
        EnvironmentalRecord {
            id: format!("{date}-{data_type}"),
            data_type: data_type.to_string(),
            location: r#"{"type":"Point","coordinates":[0.0,0.0]}"#.to_string(),
            region_name: "Test Region".to_string(),
            metrics: serde_json::Value::Null,
            severity_level: severity.to_string(),
            source: "unit-test".to_string(),
            confidence_score: 80.0,
            recorded_at,
            created_at: recorded_at,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 23).expect("valid date")
    }

    #[test]
    fn empty_input_yields_seven_zero_buckets() {
        let buckets = trend_buckets(&[], today());
        assert_eq!(buckets.len(), TREND_WINDOW_DAYS as usize);
        assert!(buckets.iter().all(|b| b.total_count == 0 && b.critical_count == 0));
        assert_eq!(buckets[0].date_label, "Aug 17");
        assert_eq!(buckets[6].date_label, "Aug 23");
    }

    #[test]
    fn todays_bucket_counts_totals_and_criticals() {
        let records = vec![
            record_on(today(), "air_quality", "critical"),
            record_on(today(), "air_quality", "critical"),
            record_on(today(), "water_quality", "low"),
        ];

        let buckets = trend_buckets(&records, today());
        let last = buckets.last().expect("seven buckets");
        assert_eq!(last.total_count, 3);
        assert_eq!(last.critical_count, 2);
    }

    #[test]
    fn records_outside_window_do_not_bucket() {
        let old = today() - Duration::days(TREND_WINDOW_DAYS);
        let records = vec![record_on(old, "temperature", "critical")];

        let buckets = trend_buckets(&records, today());
        assert!(buckets.iter().all(|b| b.total_count == 0));
    }

    #[test]
    fn buckets_are_ordered_oldest_first() {
        let yesterday = today() - Duration::days(1);
        let records = vec![record_on(yesterday, "deforestation", "high")];

        let buckets = trend_buckets(&records, today());
        assert_eq!(buckets[5].total_count, 1);
        assert_eq!(buckets[6].total_count, 0);
    }

    #[test]
    fn snapshot_builds_histograms_and_totals() {
        let records = vec![
            record_on(today(), "air_quality", "critical"),
            record_on(today(), "air_quality", "low"),
            record_on(today() - Duration::days(2), "deforestation", "critical"),
        ];

        let snapshot = build_snapshot(&records, 5, 2, today());
        assert_eq!(snapshot.total_records, 3);
        assert_eq!(snapshot.total_reports, 5);
        assert_eq!(snapshot.total_predictions, 2);
        assert_eq!(snapshot.critical_alerts, 2);
        assert_eq!(snapshot.severity_breakdown["critical"], 2);
        assert_eq!(snapshot.severity_breakdown["low"], 1);
        assert_eq!(snapshot.category_breakdown["air_quality"], 2);
        assert_eq!(snapshot.category_breakdown["deforestation"], 1);
        assert_eq!(snapshot.trend.len(), 7);
    }

    #[test]
    fn unknown_severity_counts_in_totals_but_not_criticals() {
        let records = vec![
            record_on(today(), "air_quality", "extreme"),
            record_on(today(), "air_quality", "critical"),
        ];

        let snapshot = build_snapshot(&records, 0, 0, today());
        assert_eq!(snapshot.total_records, 2);
        assert_eq!(snapshot.critical_alerts, 1);
        assert_eq!(snapshot.severity_breakdown["extreme"], 1);
        assert_eq!(snapshot.trend[6].total_count, 2);
        assert_eq!(snapshot.trend[6].critical_count, 1);
    }
}
