use crate::error::AnalyzeError;
use crate::models::{
    AnalysisResult, CalendarDate, CollectionPeriod, ErrorResult, MetricName, MetricRecord,
    Metrics, UrlResult,
};
use crate::sources::Analyzer;
use crate::summary::summarize;
use chrono::{Datelike, Duration, NaiveDate, Utc};

/// Offline analyzer producing deterministic metrics derived from each URL.
/// Hosts containing `nodata` fail the way the real service does for URLs
/// missing from the report.
pub struct MockAnalyzer;

impl Analyzer for MockAnalyzer {
    fn name(&self) -> &str {
        "offline"
    }

    fn analyze(&self, urls: &[String]) -> Result<AnalysisResult, AnalyzeError> {
        let now = Utc::now();
        let last = now.date_naive() - Duration::days(2);
        let period = CollectionPeriod {
            first_date: calendar(last - Duration::days(27)),
            last_date: calendar(last),
        };

        let mut results = Vec::new();
        let mut errors = Vec::new();

        for url in urls {
            if url.to_lowercase().contains("nodata") {
                errors.push(ErrorResult {
                    url: url.clone(),
                    error: "Request failed with status code 404".into(),
                });
                continue;
            }

            let seed = fnv1a(url);
            let mut metrics = Metrics::default();
            metrics.set(MetricName::Lcp, MetricRecord::available((1200 + seed % 2800) as f64));
            metrics.set(MetricName::Fcp, MetricRecord::available((700 + seed % 1900) as f64));
            // Roughly one in five origins has too little traffic for CLS.
            let cls = if seed % 5 == 0 {
                MetricRecord::unavailable()
            } else {
                MetricRecord::available((seed % 30) as f64 / 100.0)
            };
            metrics.set(MetricName::Cls, cls);

            results.push(UrlResult {
                url: url.clone(),
                fetch_time: Some(now),
                metrics,
                collection_period: Some(period),
            });
        }

        let summary = summarize(&results);
        Ok(AnalysisResult {
            success_count: results.len() as u64,
            total_urls: urls.len() as u64,
            results,
            errors,
            summary,
            timestamp: Some(now),
        })
    }
}

fn calendar(date: NaiveDate) -> CalendarDate {
    CalendarDate {
        year: date.year(),
        month: date.month(),
        day: date.day(),
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}
