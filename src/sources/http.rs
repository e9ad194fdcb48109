use crate::config::ApiConfig;
use crate::error::AnalyzeError;
use crate::models::AnalysisResult;
use crate::sources::Analyzer;
use serde::Serialize;
use std::time::Duration;

const ANALYZE_PATH: &str = "/api/analyze-url";

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    urls: &'a [String],
}

pub struct HttpAnalyzer {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpAnalyzer {
    pub fn new(config: &ApiConfig) -> Result<Self, AnalyzeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            endpoint: format!("{}{ANALYZE_PATH}", config.base_url.trim_end_matches('/')),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Analyzer for HttpAnalyzer {
    fn name(&self) -> &str {
        "crux-service"
    }

    fn analyze(&self, urls: &[String]) -> Result<AnalysisResult, AnalyzeError> {
        tracing::info!(endpoint = %self.endpoint, count = urls.len(), "requesting analysis");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnalyzeRequest { urls })
            .send()?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "analysis service rejected request");
            return Err(AnalyzeError::Status(status));
        }

        let body = response.text()?;
        let result: AnalysisResult = serde_json::from_str(&body)?;

        for warning in result.consistency_warnings() {
            tracing::warn!("{warning}");
        }
        tracing::info!(
            succeeded = result.results.len(),
            failed = result.errors.len(),
            "analysis complete"
        );
        Ok(result)
    }
}
