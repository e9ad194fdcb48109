use reqwest::StatusCode;

/// Rejected URL input. The request is never sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a valid URL (e.g. https://example.com)")]
    Empty,

    #[error("Please enter valid URLs (e.g. https://example.com)")]
    Invalid { rejected: Vec<String> },
}

/// Failure at the analysis request boundary.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("analysis request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("analysis service returned HTTP {0}")]
    Status(StatusCode),

    #[error("could not decode analysis response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl AnalyzeError {
    /// The generic message shown to the user for any request failure.
    pub fn user_message(&self) -> &'static str {
        "Analysis failed, please retry."
    }
}
