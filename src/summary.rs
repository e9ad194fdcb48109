use crate::format::format_number;
use crate::models::{MetricName, Summary, SummaryEntry, UrlResult};
use std::collections::BTreeMap;

/// Aggregate each metric over the rows that carry a usable value for it.
/// Metrics with no such rows are left out entirely.
pub fn summarize(results: &[UrlResult]) -> Summary {
    let mut entries = BTreeMap::new();

    for metric in MetricName::ALL {
        let values: Vec<f64> = results
            .iter()
            .filter_map(|r| r.metrics.displayable(metric))
            .filter_map(|v| v.as_f64())
            .collect();

        if values.is_empty() {
            continue;
        }

        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        entries.insert(
            metric,
            SummaryEntry {
                avg: sum / values.len() as f64,
                min,
                max,
                count: values.len() as u64,
            },
        );
    }

    Summary(entries)
}

/// One summary card, already formatted for display.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Card {
    pub metric: MetricName,
    pub avg: String,
    pub count: u64,
    pub min: String,
    pub max: String,
}

pub fn cards(summary: &Summary) -> Vec<Card> {
    summary
        .iter()
        .map(|(metric, entry)| Card {
            metric,
            avg: format_number(entry.avg),
            count: entry.count,
            min: format_number(entry.min),
            max: format_number(entry.max),
        })
        .collect()
}
