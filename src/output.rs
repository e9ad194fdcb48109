use crate::dashboard::DashboardView;
use crate::format::{Status, format_number};
use crate::models::MetricName;
use anyhow::Result;
use owo_colors::OwoColorize;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "table" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => anyhow::bail!("Unknown format: {s}. Expected: table, markdown, json, yaml"),
        }
    }
}

pub fn render(view: &DashboardView, format: OutputFormat, color: bool) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(view)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(view)?),
        OutputFormat::Table => Ok(render_table(view, color)),
        OutputFormat::Markdown => Ok(render_markdown(view)),
    }
}

fn paint(text: &str, status: Status, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    match status {
        Status::Pass => text.green().to_string(),
        Status::Fail => text.red().to_string(),
        Status::Neutral => text.bright_black().to_string(),
    }
}

fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    format!("{text}{}", " ".repeat(width.saturating_sub(len)))
}

fn filter_line(view: &DashboardView) -> Option<String> {
    let active: Vec<String> = view
        .filters
        .active()
        .map(|(metric, threshold)| format!("{} <= {}", metric.label(), format_number(threshold)))
        .collect();
    (!active.is_empty()).then(|| format!("Filters: {}", active.join(", ")))
}

fn render_table(view: &DashboardView, color: bool) -> String {
    let mut out = String::new();

    if let Some(err) = &view.input_error {
        let _ = writeln!(out, "{}", paint(err, Status::Fail, color));
    }
    if let Some(err) = &view.request_error {
        let _ = writeln!(out, "{}", paint(err, Status::Fail, color));
    }

    if view.has_results {
        let mut widths: Vec<usize> = view.headers.iter().map(|h| h.chars().count()).collect();
        for row in &view.rows {
            widths[0] = widths[0].max(row.url.chars().count());
            for (i, metric) in MetricName::ALL.into_iter().enumerate() {
                widths[i + 1] = widths[i + 1].max(row.cell(metric).text.chars().count());
            }
        }

        let _ = writeln!(out, "CrUX Data");
        if let Some(line) = filter_line(view) {
            let _ = writeln!(out, "{line}");
        }
        let header: Vec<String> = view
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad(h, *w))
            .collect();
        let _ = writeln!(out, "{}", header.join("  ").trim_end());
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        let _ = writeln!(out, "{}", rule.join("  "));

        for row in &view.rows {
            let mut line = pad(&row.url, widths[0]);
            for (i, metric) in MetricName::ALL.into_iter().enumerate() {
                let cell = row.cell(metric);
                line.push_str("  ");
                line.push_str(&paint(&pad(&cell.text, widths[i + 1]), cell.status, color));
            }
            let _ = writeln!(out, "{}", line.trim_end());
        }
        if view.rows.is_empty() {
            let _ = writeln!(out, "(no rows match the current filters)");
        }
        if let Some((first, last)) = view.collection_period {
            let _ = writeln!(out, "Collection period: {first} to {last}");
        }

        if !view.summary.is_empty() {
            let _ = writeln!(out, "\nSummary Statistics");
            for card in &view.summary {
                let _ = writeln!(
                    out,
                    "{:<4} avg {}  count {}  min {}  max {}",
                    card.metric.label(),
                    card.avg,
                    card.count,
                    paint(&card.min, Status::Pass, color),
                    paint(&card.max, Status::Fail, color),
                );
            }
        }
    }

    if !view.failures.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "Failed URLs");
        for failure in &view.failures {
            let _ = writeln!(out, "  {}", failure.url);
            let _ = writeln!(out, "    {}", paint(&failure.message, Status::Fail, color));
        }
    }

    out.trim_end().to_string()
}

fn render_markdown(view: &DashboardView) -> String {
    let mut out = String::new();

    for err in [&view.input_error, &view.request_error].into_iter().flatten() {
        let _ = writeln!(out, "> **Error:** {err}\n");
    }

    if view.has_results {
        let _ = writeln!(out, "## CrUX Data\n");
        if let Some(line) = filter_line(view) {
            let _ = writeln!(out, "_{line}_\n");
        }
        let _ = writeln!(out, "| {} |", view.headers.join(" | "));
        let _ = writeln!(out, "|{}", "---|".repeat(view.headers.len()));
        for row in &view.rows {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} |",
                row.url, row.lcp.text, row.fcp.text, row.cls.text
            );
        }
        if let Some((first, last)) = view.collection_period {
            let _ = writeln!(out, "\nCollection period: {first} to {last}");
        }

        if !view.summary.is_empty() {
            let _ = writeln!(out, "\n## Summary Statistics\n");
            let _ = writeln!(out, "| Metric | Avg | Count | Min | Max |");
            let _ = writeln!(out, "|---|---|---|---|---|");
            for card in &view.summary {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {} |",
                    card.metric.label(),
                    card.avg,
                    card.count,
                    card.min,
                    card.max
                );
            }
        }
    }

    if !view.failures.is_empty() {
        let _ = writeln!(out, "\n## Failed URLs\n");
        for failure in &view.failures {
            let _ = writeln!(out, "- `{}`: {}", failure.url, failure.message);
        }
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::Dashboard;
    use crate::sources::mock::MockAnalyzer;

    fn sample() -> Dashboard {
        let mut dashboard = Dashboard::new();
        dashboard.submit("https://example.com\nhttps://nodata.example", &MockAnalyzer);
        dashboard
    }

    #[test]
    fn parses_formats() {
        assert_eq!(OutputFormat::from_str("md").unwrap(), OutputFormat::Markdown);
        assert_eq!(OutputFormat::from_str("yml").unwrap(), OutputFormat::Yaml);
        assert!(OutputFormat::from_str("csv").is_err());
    }

    #[test]
    fn table_without_color_has_sections() {
        let text = render(&sample().snapshot(), OutputFormat::Table, false).unwrap();
        assert!(text.contains("URL ↑"));
        assert!(text.contains("https://example.com"));
        assert!(text.contains("Summary Statistics"));
        assert!(text.contains("Failed URLs"));
        assert!(text.contains("CrUX data is not available for https://nodata.example"));
        assert!(!text.contains('\u{1b}'));
    }

    #[test]
    fn table_with_color_emits_ansi() {
        let text = render(&sample().snapshot(), OutputFormat::Table, true).unwrap();
        assert!(text.contains('\u{1b}'));
    }

    #[test]
    fn markdown_lists_rows_and_summary() {
        let text = render(&sample().snapshot(), OutputFormat::Markdown, false).unwrap();
        assert!(text.contains("| URL ↑ | LCP (p75) | FCP (p75) | CLS (p75) |"));
        assert!(text.contains("| Metric | Avg | Count | Min | Max |"));
        assert!(text.contains("- `https://nodata.example`"));
    }

    #[test]
    fn json_carries_rows_and_failures() {
        let text = render(&sample().snapshot(), OutputFormat::Json, false).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["rows"].as_array().map(Vec::len), Some(1));
        assert_eq!(value["failures"][0]["url"], "https://nodata.example");
        assert_eq!(value["sort"]["field"], "url");
        assert_eq!(value["sort"]["direction"], "asc");
    }

    #[test]
    fn empty_filter_result_is_called_out() {
        let mut dashboard = sample();
        dashboard.filters.set_filter(MetricName::Lcp, "1");
        let text = render(&dashboard.snapshot(), OutputFormat::Table, false).unwrap();
        assert!(text.contains("Filters: LCP <= 1.00"));
        assert!(text.contains("(no rows match the current filters)"));
    }
}
