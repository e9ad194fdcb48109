//! Session state for one dashboard: the current result set, the loading
//! flag, the last input or request error, and the table's sort and filter
//! state. All rendering goes through [`Dashboard::snapshot`].

use crate::error::{AnalyzeError, ValidationError};
use crate::models::{AnalysisResult, CollectionPeriod};
use crate::sources::Analyzer;
use crate::summary::{Card, cards};
use crate::table::{FilterState, Row, SortState, column_headers, derive_view, render_row};
use crate::validate::parse_url_list;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// What happened to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// Input failed validation; nothing was sent.
    Rejected,
    /// Another request is still outstanding.
    Busy,
    /// The request failed; the previous results are kept.
    Failed,
    Completed,
}

#[derive(Default)]
pub struct Dashboard {
    results: Option<AnalysisResult>,
    loading: bool,
    input_error: Option<ValidationError>,
    request_error: Option<AnalyzeError>,
    pub sort: SortState,
    pub filters: FilterState,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Option<&AnalysisResult> {
        self.results.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn input_error(&self) -> Option<&ValidationError> {
        self.input_error.as_ref()
    }

    pub fn request_error(&self) -> Option<&AnalyzeError> {
        self.request_error.as_ref()
    }

    /// Validate `input` and, if it passes, run the analysis. A successful
    /// response replaces the result set in one step.
    pub fn submit(&mut self, input: &str, analyzer: &dyn Analyzer) -> Submission {
        if self.loading {
            return Submission::Busy;
        }
        self.input_error = None;

        let urls = match parse_url_list(input) {
            Ok(urls) => urls,
            Err(err) => {
                tracing::info!(error = %err, "submission rejected");
                self.input_error = Some(err);
                return Submission::Rejected;
            }
        };

        self.loading = true;
        let outcome = analyzer.analyze(&urls);
        self.loading = false;

        match outcome {
            Ok(result) => {
                self.results = Some(result);
                self.request_error = None;
                Submission::Completed
            }
            Err(err) => {
                tracing::error!(analyzer = analyzer.name(), error = %err, "analysis failed");
                self.request_error = Some(err);
                Submission::Failed
            }
        }
    }

    pub fn snapshot(&self) -> DashboardView {
        let mut view = DashboardView {
            input_error: self.input_error.as_ref().map(ToString::to_string),
            request_error: self.request_error.as_ref().map(|e| e.user_message().to_string()),
            sort: self.sort,
            filters: self.filters.clone(),
            headers: column_headers(&self.sort),
            rows: vec![],
            summary: vec![],
            failures: vec![],
            has_results: false,
            collection_period: None,
            timestamp: None,
        };

        let Some(result) = &self.results else {
            return view;
        };

        view.timestamp = result.timestamp;
        view.rows = derive_view(&result.results, &self.sort, &self.filters)
            .into_iter()
            .map(render_row)
            .collect();
        view.summary = cards(&result.summary);
        view.failures = result
            .errors
            .iter()
            .map(|e| FailedUrl {
                url: e.url.clone(),
                message: describe_error(&e.url, &e.error),
            })
            .collect();
        view.collection_period =
            CollectionPeriod::span(result.results.iter().filter_map(|r| r.collection_period.as_ref()));
        view.has_results = !result.results.is_empty();
        view
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedUrl {
    pub url: String,
    pub message: String,
}

/// Everything a renderer needs, with no further lookups into the raw data.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_error: Option<String>,
    pub sort: SortState,
    pub filters: FilterState,
    #[serde(skip)]
    pub headers: Vec<String>,
    #[serde(skip)]
    pub has_results: bool,
    pub rows: Vec<Row>,
    pub summary: Vec<Card>,
    pub failures: Vec<FailedUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_period: Option<(NaiveDate, NaiveDate)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Substitute a friendly message when the service says it has no data for
/// the URL; anything else is shown verbatim.
pub fn describe_error(url: &str, raw: &str) -> String {
    let lower = raw.to_lowercase();
    if raw.contains("404")
        || lower.contains("not found")
        || lower.contains("no data")
        || lower.contains("not available")
    {
        format!("CrUX data is not available for {url}")
    } else {
        raw.to_string()
    }
}
