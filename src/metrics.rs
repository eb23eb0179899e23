//! Deterministic aggregation of honeypot events.
//!
//! The summary is a pure function of the input: identical events always
//! produce an identical summary. Every ranking has a documented tie-break
//! so output ordering is stable across runs.

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;

use crate::types::{HoneypotEvent, MetricsSummary, Severity};

/// Number of offending source IPs reported in the ranked list.
pub const TOP_SOURCES: usize = 10;

/// Aggregate a full event set into a `MetricsSummary`.
///
/// Empty input yields an all-zero summary, never an error; the composer
/// still renders a structurally complete report from it.
pub fn aggregate(events: &[HoneypotEvent]) -> MetricsSummary {
    let mut category_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut source_counts: BTreeMap<String, u64> = BTreeMap::new();
    let mut day_counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    let mut severity_counts: BTreeMap<Severity, u64> =
        Severity::ALL.iter().map(|s| (*s, 0)).collect();
    let mut sources: HashSet<&str> = HashSet::new();

    for event in events {
        *category_counts.entry(event.category.clone()).or_insert(0) += 1;
        *source_counts.entry(event.source_ip.clone()).or_insert(0) += 1;
        *day_counts.entry(event.timestamp.date()).or_insert(0) += 1;
        *severity_counts.entry(event.severity).or_insert(0) += 1;
        sources.insert(event.source_ip.as_str());
    }

    // Count descending, category name ascending on equal counts.
    let mut ranked_categories: Vec<(String, u64)> = category_counts.into_iter().collect();
    ranked_categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    // Count descending, lexical IP order on equal counts.
    let mut top_sources: Vec<(String, u64)> = source_counts.into_iter().collect();
    top_sources.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top_sources.truncate(TOP_SOURCES);

    let period = match (day_counts.keys().next(), day_counts.keys().next_back()) {
        (Some(min), Some(max)) => Some((*min, *max)),
        _ => None,
    };
    let daily_counts = fill_daily_buckets(&day_counts, period);

    MetricsSummary {
        total_events: events.len() as u64,
        unique_sources: sources.len() as u64,
        ranked_categories,
        top_sources,
        daily_counts,
        severity_counts: Severity::ALL
            .iter()
            .map(|s| (*s, severity_counts.get(s).copied().unwrap_or(0)))
            .collect(),
        period,
    }
}

/// Expand sparse per-day counts into a contiguous, zero-filled series
/// spanning the observed period. Empty buckets report zero, not omission.
fn fill_daily_buckets(
    day_counts: &BTreeMap<NaiveDate, u64>,
    period: Option<(NaiveDate, NaiveDate)>,
) -> Vec<(NaiveDate, u64)> {
    let (min, max) = match period {
        Some(bounds) => bounds,
        None => return Vec::new(),
    };

    let mut buckets = Vec::new();
    let mut day = min;
    loop {
        buckets.push((day, day_counts.get(&day).copied().unwrap_or(0)));
        if day >= max {
            break;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn event(ts: &str, ip: &str, category: &str, severity: Severity) -> HoneypotEvent {
        HoneypotEvent {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            source_ip: ip.to_string(),
            category: category.to_string(),
            severity,
            detail: None,
        }
    }

    #[test]
    fn test_category_counts_sum_to_total() {
        let events = vec![
            event("2025-04-01 10:00:00", "10.0.0.1", "ssh", Severity::High),
            event("2025-04-01 11:00:00", "10.0.0.2", "ssh", Severity::Low),
            event("2025-04-02 09:00:00", "10.0.0.1", "http", Severity::Medium),
        ];
        let summary = aggregate(&events);

        let category_total: u64 = summary.ranked_categories.iter().map(|(_, c)| c).sum();
        assert_eq!(category_total, summary.total_events);
        assert_eq!(summary.total_events, 3);
        assert_eq!(summary.unique_sources, 2);
    }

    #[test]
    fn test_ranking_tie_breaks() {
        let events = vec![
            event("2025-04-01 10:00:00", "10.0.0.9", "telnet", Severity::Low),
            event("2025-04-01 10:01:00", "10.0.0.1", "ssh", Severity::Low),
            event("2025-04-01 10:02:00", "10.0.0.5", "ftp", Severity::Low),
        ];
        let summary = aggregate(&events);

        // Equal counts: categories by name ascending, IPs by lexical order.
        assert_eq!(
            summary.ranked_categories,
            vec![
                ("ftp".to_string(), 1),
                ("ssh".to_string(), 1),
                ("telnet".to_string(), 1)
            ]
        );
        assert_eq!(
            summary.top_sources,
            vec![
                ("10.0.0.1".to_string(), 1),
                ("10.0.0.5".to_string(), 1),
                ("10.0.0.9".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_top_sources_truncated() {
        let events: Vec<HoneypotEvent> = (0..25)
            .map(|i| {
                event(
                    "2025-04-01 10:00:00",
                    &format!("10.0.0.{}", i),
                    "scan",
                    Severity::Low,
                )
            })
            .collect();
        let summary = aggregate(&events);
        assert_eq!(summary.top_sources.len(), TOP_SOURCES);
    }

    #[test]
    fn test_daily_buckets_zero_filled() {
        let events = vec![
            event("2025-04-01 10:00:00", "10.0.0.1", "ssh", Severity::High),
            event("2025-04-04 10:00:00", "10.0.0.1", "ssh", Severity::High),
        ];
        let summary = aggregate(&events);

        assert_eq!(summary.daily_counts.len(), 4);
        assert_eq!(summary.daily_counts[0].1, 1);
        assert_eq!(summary.daily_counts[1].1, 0);
        assert_eq!(summary.daily_counts[2].1, 0);
        assert_eq!(summary.daily_counts[3].1, 1);
        assert_eq!(
            summary.period,
            Some((
                NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 4, 4).unwrap()
            ))
        );
    }

    #[test]
    fn test_severity_distribution_order() {
        let events = vec![
            event("2025-04-01 10:00:00", "10.0.0.1", "ssh", Severity::Unknown),
            event("2025-04-01 11:00:00", "10.0.0.1", "ssh", Severity::Critical),
        ];
        let summary = aggregate(&events);

        let labels: Vec<&str> = summary.severity_counts.iter().map(|(s, _)| s.label()).collect();
        assert_eq!(labels, vec!["Critical", "High", "Medium", "Low", "Unknown"]);
        assert_eq!(summary.severity_counts[0].1, 1);
        assert_eq!(summary.severity_counts[4].1, 1);
    }

    #[test]
    fn test_empty_input_yields_zero_summary() {
        let summary = aggregate(&[]);
        assert_eq!(summary.total_events, 0);
        assert_eq!(summary.unique_sources, 0);
        assert!(summary.ranked_categories.is_empty());
        assert!(summary.top_sources.is_empty());
        assert!(summary.daily_counts.is_empty());
        assert_eq!(summary.period, None);
        assert!(summary.severity_counts.iter().all(|(_, c)| *c == 0));
    }

    #[test]
    fn test_aggregation_is_deterministic() {
        let events = vec![
            event("2025-04-01 10:00:00", "10.0.0.3", "ssh", Severity::High),
            event("2025-04-02 11:00:00", "10.0.0.1", "http", Severity::Low),
            event("2025-04-02 12:00:00", "10.0.0.2", "ssh", Severity::Medium),
        ];
        assert_eq!(aggregate(&events), aggregate(&events));
    }
}
