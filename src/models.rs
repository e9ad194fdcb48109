use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Longest numeric prefix, the way `parseFloat` reads it.
static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?")
        .expect("numeric prefix pattern is valid")
});

/// Parse loosely-typed numeric text. Leading whitespace is skipped and
/// trailing garbage after the number is ignored (`"42ms"` is `42`).
/// Returns `None` when no finite number can be read.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_start();
    let prefix = NUMERIC_PREFIX.find(trimmed)?;
    prefix
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Read a timestamp the service may have written in several shapes: RFC 3339,
/// or an offset-less ISO date-time (with `T` or a space) taken as UTC.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Deserialize an optional timestamp without failing the whole response:
/// anything unreadable becomes `None` and is logged.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(text)) => {
            let parsed = parse_timestamp(&text);
            if parsed.is_none() {
                tracing::warn!(value = %text, "ignoring unreadable timestamp");
            }
            parsed
        }
        Some(other) => {
            tracing::warn!(value = %other, "ignoring non-string timestamp");
            None
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricName {
    Lcp,
    Fcp,
    Cls,
}

impl MetricName {
    pub const ALL: [MetricName; 3] = [MetricName::Lcp, MetricName::Fcp, MetricName::Cls];

    pub fn key(self) -> &'static str {
        match self {
            Self::Lcp => "lcp",
            Self::Fcp => "fcp",
            Self::Cls => "cls",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Lcp => "LCP",
            Self::Fcp => "FCP",
            Self::Cls => "CLS",
        }
    }

    /// Suffix appended to a formatted cell value.
    pub fn unit(self) -> &'static str {
        match self {
            Self::Lcp | Self::Fcp => " ms",
            Self::Cls => "",
        }
    }

    /// Fixed display threshold separating "good" from "needs work".
    pub fn display_threshold(self) -> f64 {
        match self {
            Self::Lcp => 2500.0,
            Self::Fcp => 1800.0,
            Self::Cls => 0.1,
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for MetricName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lcp" | "largest-contentful-paint" => Ok(Self::Lcp),
            "fcp" | "first-contentful-paint" => Ok(Self::Fcp),
            "cls" | "cumulative-layout-shift" => Ok(Self::Cls),
            _ => Err(format!("Unknown metric: {s}. Expected: lcp, fcp, cls")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Float(f64),
    Text(String),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) if f.is_finite() => Some(*f),
            Self::Float(_) => None,
            Self::Text(t) => parse_number(t),
        }
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(default)]
    pub p75: Option<MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p90: Option<MetricValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p99: Option<MetricValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub distribution: Vec<serde_json::Value>,
    pub status: MetricStatus,
}

impl MetricRecord {
    pub fn available(p75: impl Into<MetricValue>) -> Self {
        Self {
            p75: Some(p75.into()),
            p90: None,
            p99: None,
            distribution: vec![],
            status: MetricStatus::Available,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            p75: None,
            p90: None,
            p99: None,
            distribution: vec![],
            status: MetricStatus::Unavailable,
        }
    }

    /// The p75 value, but only when the record is eligible for display and
    /// comparison. An "available" record with a null value is still no data.
    pub fn displayable(&self) -> Option<&MetricValue> {
        match self.status {
            MetricStatus::Available => self.p75.as_ref(),
            MetricStatus::Unavailable => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lcp: Option<MetricRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fcp: Option<MetricRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cls: Option<MetricRecord>,
}

impl Metrics {
    pub fn get(&self, metric: MetricName) -> Option<&MetricRecord> {
        match metric {
            MetricName::Lcp => self.lcp.as_ref(),
            MetricName::Fcp => self.fcp.as_ref(),
            MetricName::Cls => self.cls.as_ref(),
        }
    }

    pub fn set(&mut self, metric: MetricName, record: MetricRecord) {
        let slot = match metric {
            MetricName::Lcp => &mut self.lcp,
            MetricName::Fcp => &mut self.fcp,
            MetricName::Cls => &mut self.cls,
        };
        *slot = Some(record);
    }

    pub fn displayable(&self, metric: MetricName) -> Option<&MetricValue> {
        self.get(metric).and_then(MetricRecord::displayable)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    pub fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPeriod {
    pub first_date: CalendarDate,
    pub last_date: CalendarDate,
}

impl CollectionPeriod {
    /// Earliest first date to latest last date across `periods`, skipping
    /// dates that are not real calendar days.
    pub fn span<'a>(
        periods: impl IntoIterator<Item = &'a CollectionPeriod>,
    ) -> Option<(NaiveDate, NaiveDate)> {
        periods
            .into_iter()
            .filter_map(|p| Some((p.first_date.to_naive()?, p.last_date.to_naive()?)))
            .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlResult {
    pub url: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub fetch_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metrics: Metrics,
    #[serde(default)]
    pub collection_period: Option<CollectionPeriod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

/// Per-metric aggregates keyed by the closed metric set, in `lcp, fcp, cls`
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Summary(pub BTreeMap<MetricName, SummaryEntry>);

impl Summary {
    pub fn get(&self, metric: MetricName) -> Option<&SummaryEntry> {
        self.0.get(&metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (MetricName, &SummaryEntry)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<BTreeMap<String, SummaryEntry>> for Summary {
    fn from(raw: BTreeMap<String, SummaryEntry>) -> Self {
        let mut entries = BTreeMap::new();
        for (key, entry) in raw {
            match key.parse::<MetricName>() {
                Ok(metric) => {
                    entries.insert(metric, entry);
                }
                Err(_) => tracing::warn!(key = %key, "skipping unknown summary metric"),
            }
        }
        Self(entries)
    }
}

impl<'de> Deserialize<'de> for Summary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, SummaryEntry>::deserialize(deserializer)?;
        Ok(raw.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(default)]
    pub results: Vec<UrlResult>,
    #[serde(default)]
    pub errors: Vec<ErrorResult>,
    #[serde(default)]
    pub summary: Summary,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub total_urls: u64,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl AnalysisResult {
    /// Describe any count mismatches in the response. The dashboard renders
    /// the data regardless; these only feed the log.
    pub fn consistency_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let results = self.results.len() as u64;
        let errors = self.errors.len() as u64;

        if self.success_count != results {
            warnings.push(format!(
                "successCount is {} but {} results were returned",
                self.success_count, results
            ));
        }
        if results + errors > self.total_urls {
            warnings.push(format!(
                "{} results and {} errors exceed totalUrls {}",
                results, errors, self.total_urls
            ));
        } else if results + errors < self.total_urls {
            warnings.push(format!(
                "{} of {} submitted URLs are missing from the response",
                self.total_urls - results - errors,
                self.total_urls
            ));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_follows_parse_float() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("  1.5e2"), Some(150.0));
        assert_eq!(parse_number("42ms"), Some(42.0));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e"), Some(1.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("1e999"), None);
    }

    #[test]
    fn metric_name_parses_case_insensitively() {
        assert_eq!("LCP".parse::<MetricName>(), Ok(MetricName::Lcp));
        assert_eq!(" cls ".parse::<MetricName>(), Ok(MetricName::Cls));
        assert!("ttfb".parse::<MetricName>().is_err());
    }

    #[test]
    fn available_with_null_value_is_not_displayable() {
        let record = MetricRecord {
            p75: None,
            ..MetricRecord::available(1.0)
        };
        assert_eq!(record.displayable(), None);

        let unavailable = MetricRecord {
            p75: Some(MetricValue::Float(900.0)),
            ..MetricRecord::unavailable()
        };
        assert_eq!(unavailable.displayable(), None);
    }

    #[test]
    fn deserializes_loosely_typed_response() {
        let json = r#"{
            "results": [{
                "url": "https://example.com",
                "fetchTime": "2024-03-01T12:00:00Z",
                "metrics": {
                    "lcp": {"p75": 2000, "status": "available"},
                    "fcp": {"p75": "1500.5", "status": "available"},
                    "cls": {"p75": null, "status": "unavailable"}
                },
                "collectionPeriod": {
                    "firstDate": {"year": 2024, "month": 1, "day": 30},
                    "lastDate": {"year": 2024, "month": 2, "day": 26}
                }
            }],
            "errors": [{"url": "https://missing.example", "error": "404 Not Found"}],
            "summary": {
                "lcp": {"avg": 2000, "min": 2000, "max": 2000, "count": 1},
                "ttfb": {"avg": 1, "min": 1, "max": 1, "count": 1}
            },
            "successCount": 1,
            "totalUrls": 2,
            "timestamp": "2024-03-01T12:00:01Z"
        }"#;

        let parsed: AnalysisResult = serde_json::from_str(json).unwrap();
        let row = &parsed.results[0];
        assert_eq!(row.metrics.displayable(MetricName::Lcp), Some(&MetricValue::Float(2000.0)));
        assert_eq!(
            row.metrics.displayable(MetricName::Fcp).and_then(MetricValue::as_f64),
            Some(1500.5)
        );
        assert_eq!(row.metrics.displayable(MetricName::Cls), None);
        assert_eq!(parsed.summary.len(), 1);
        assert_eq!(parsed.summary.get(MetricName::Lcp).map(|e| e.count), Some(1));
        assert!(parsed.consistency_warnings().is_empty());
    }

    #[test]
    fn reads_timestamps_without_offset() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_micro_opt(12, 0, 1, 123_456)
            .unwrap()
            .and_utc();
        assert_eq!(parse_timestamp("2024-03-01T12:00:01.123456"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 12:00:01.123456"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T13:00:01.123456+01:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn loose_timestamps_do_not_fail_the_response() {
        let json = r#"{
            "results": [
                {"url": "https://a.com", "fetchTime": "2024-03-01 12:00:01", "metrics": {}},
                {"url": "https://b.com", "fetchTime": "not a date", "metrics": {}},
                {"url": "https://c.com", "fetchTime": 1709294401, "metrics": {}}
            ],
            "errors": [],
            "summary": {},
            "successCount": 3,
            "totalUrls": 3,
            "timestamp": "2024-03-01T12:00:01.123456"
        }"#;
        let parsed: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.results[0].fetch_time,
            parse_timestamp("2024-03-01T12:00:01Z")
        );
        assert_eq!(parsed.results[1].fetch_time, None);
        assert_eq!(parsed.results[2].fetch_time, None);
        assert!(parsed.timestamp.is_some());

        let without_timestamp = r#"{"results": [], "errors": [], "summary": {}}"#;
        let parsed: AnalysisResult = serde_json::from_str(without_timestamp).unwrap();
        assert_eq!(parsed.timestamp, None);
    }

    #[test]
    fn consistency_warnings_flag_mismatched_counts() {
        let result = AnalysisResult {
            results: vec![],
            errors: vec![],
            summary: Summary::default(),
            success_count: 1,
            total_urls: 3,
            timestamp: Some(Utc::now()),
        };
        assert_eq!(result.consistency_warnings().len(), 2);
    }

    #[test]
    fn collection_span_covers_all_periods() {
        let a = CollectionPeriod {
            first_date: CalendarDate { year: 2024, month: 1, day: 2 },
            last_date: CalendarDate { year: 2024, month: 1, day: 29 },
        };
        let b = CollectionPeriod {
            first_date: CalendarDate { year: 2023, month: 12, day: 30 },
            last_date: CalendarDate { year: 2024, month: 1, day: 27 },
        };
        let (first, last) = CollectionPeriod::span([&a, &b]).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2023, 12, 30).unwrap());
        assert_eq!(last, NaiveDate::from_ymd_opt(2024, 1, 29).unwrap());
    }
}
