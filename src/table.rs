//! Sortable, filterable view over a result set.
//!
//! Everything here is a pure function of `(results, SortState, FilterState)`.
//! The dashboard owns the state and calls [`derive_view`] whenever it renders.

use crate::format::{Status, classify, format_value};
use crate::models::{MetricName, UrlResult, parse_number};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Url,
    Metric(MetricName),
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => f.write_str("url"),
            Self::Metric(m) => f.write_str(m.key()),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("url") {
            return Ok(Self::Url);
        }
        s.parse::<MetricName>()
            .map(Self::Metric)
            .map_err(|_| format!("Unknown sort field: {s}. Expected: url, lcp, fcp, cls"))
    }
}

impl Serialize for SortField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            field: SortField::Url,
            direction: SortDirection::Asc,
        }
    }
}

impl SortState {
    /// Selecting the active field flips direction; any other field starts
    /// ascending.
    pub fn set_sort(&mut self, field: SortField) {
        if self.field == field {
            self.direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.field = field;
            self.direction = SortDirection::Asc;
        }
    }

    /// Arrow shown next to a column header.
    pub fn indicator(&self, field: SortField) -> &'static str {
        match (self.field == field, self.direction) {
            (false, _) => "",
            (true, SortDirection::Asc) => " ↑",
            (true, SortDirection::Desc) => " ↓",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Filter {
    pub threshold: f64,
    /// A zero threshold (including empty or unparsable input) constrains
    /// nothing.
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FilterState(BTreeMap<MetricName, Filter>);

impl FilterState {
    pub fn set_filter(&mut self, metric: MetricName, raw: &str) {
        let threshold = parse_number(raw).unwrap_or(0.0);
        let filter = Filter {
            threshold,
            active: threshold != 0.0,
        };
        tracing::debug!(%metric, raw, threshold, active = filter.active, "filter updated");
        self.0.insert(metric, filter);
    }

    pub fn get(&self, metric: MetricName) -> Option<&Filter> {
        self.0.get(&metric)
    }

    pub fn active(&self) -> impl Iterator<Item = (MetricName, f64)> + '_ {
        self.0
            .iter()
            .filter(|(_, f)| f.active)
            .map(|(m, f)| (*m, f.threshold))
    }

    /// Rows with no usable value for a metric always pass that metric's
    /// filter.
    pub fn admits(&self, row: &UrlResult) -> bool {
        self.active().all(|(metric, threshold)| {
            match row.metrics.displayable(metric).and_then(|v| v.as_f64()) {
                Some(value) => value <= threshold,
                None => true,
            }
        })
    }
}

/// Filter then stable-sort `results`. The input is left untouched.
pub fn derive_view<'a>(
    results: &'a [UrlResult],
    sort: &SortState,
    filters: &FilterState,
) -> Vec<&'a UrlResult> {
    let mut view: Vec<&UrlResult> = results.iter().filter(|r| filters.admits(r)).collect();
    view.sort_by(|a, b| compare(a, b, sort));
    view
}

fn compare(a: &UrlResult, b: &UrlResult, sort: &SortState) -> Ordering {
    match sort.field {
        SortField::Url => match sort.direction {
            SortDirection::Asc => locale_compare(&a.url, &b.url),
            SortDirection::Desc => locale_compare(&b.url, &a.url),
        },
        SortField::Metric(metric) => {
            let a_key = sort_key(a, metric, sort.direction);
            let b_key = sort_key(b, metric, sort.direction);
            match sort.direction {
                SortDirection::Asc => a_key.partial_cmp(&b_key),
                SortDirection::Desc => b_key.partial_cmp(&a_key),
            }
            .unwrap_or(Ordering::Equal)
        }
    }
}

/// Missing values sort last in either direction.
fn sort_key(row: &UrlResult, metric: MetricName, direction: SortDirection) -> f64 {
    row.metrics
        .displayable(metric)
        .and_then(|v| v.as_f64())
        .unwrap_or(match direction {
            SortDirection::Asc => f64::INFINITY,
            SortDirection::Desc => f64::NEG_INFINITY,
        })
}

/// ASCII punctuation and symbols in root collation order. They all sort
/// before digits, which sort before letters.
const PUNCTUATION_ORDER: &str = "_-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Primary collation weight: case-insensitive, punctuation first.
fn primary_weight(c: char) -> u32 {
    if c.is_whitespace() {
        return 1;
    }
    if let Some(pos) = PUNCTUATION_ORDER.find(c) {
        return 10 + pos as u32;
    }
    if c.is_ascii_digit() {
        return 100 + (c as u32 - '0' as u32);
    }
    if c.is_ascii_alphabetic() {
        return 200 + (c.to_ascii_lowercase() as u32 - 'a' as u32);
    }
    // Everything else after ASCII letters, by lowercased code point.
    1000 + c.to_lowercase().next().unwrap_or(c) as u32
}

fn case_weight(c: char) -> u8 {
    u8::from(c.is_uppercase())
}

/// Root-locale style comparison: primary weights across the whole string
/// first, then case with lowercase before uppercase.
fn locale_compare(a: &str, b: &str) -> Ordering {
    a.chars()
        .map(primary_weight)
        .cmp(b.chars().map(primary_weight))
        .then_with(|| a.chars().map(case_weight).cmp(b.chars().map(case_weight)))
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub text: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    pub url: String,
    pub lcp: Cell,
    pub fcp: Cell,
    pub cls: Cell,
}

impl Row {
    pub fn cell(&self, metric: MetricName) -> &Cell {
        match metric {
            MetricName::Lcp => &self.lcp,
            MetricName::Fcp => &self.fcp,
            MetricName::Cls => &self.cls,
        }
    }
}

pub fn render_cell(row: &UrlResult, metric: MetricName) -> Cell {
    match row.metrics.displayable(metric) {
        Some(value) => Cell {
            text: format!("{}{}", format_value(Some(value)), metric.unit()),
            status: classify(Some(value), metric.display_threshold()),
        },
        None => Cell {
            text: "N/A".into(),
            status: Status::Neutral,
        },
    }
}

pub fn render_row(row: &UrlResult) -> Row {
    Row {
        url: row.url.clone(),
        lcp: render_cell(row, MetricName::Lcp),
        fcp: render_cell(row, MetricName::Fcp),
        cls: render_cell(row, MetricName::Cls),
    }
}

pub fn column_headers(sort: &SortState) -> Vec<String> {
    let mut headers = vec![format!("URL{}", sort.indicator(SortField::Url))];
    for metric in MetricName::ALL {
        headers.push(format!(
            "{} (p75){}",
            metric.label(),
            sort.indicator(SortField::Metric(metric))
        ));
    }
    headers
}
