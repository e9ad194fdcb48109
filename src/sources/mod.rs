pub mod http;
pub mod mock;

use crate::config::Config;
use crate::error::AnalyzeError;
use crate::models::AnalysisResult;

/// Something that can turn a list of URLs into an analysis.
pub trait Analyzer {
    fn name(&self) -> &str;
    fn analyze(&self, urls: &[String]) -> Result<AnalysisResult, AnalyzeError>;
}

/// The analyzer selected by the CLI: the remote service, or the offline
/// generator when `offline` is set.
pub fn analyzer_for(config: &Config, offline: bool) -> Result<Box<dyn Analyzer>, AnalyzeError> {
    if offline {
        return Ok(Box::new(mock::MockAnalyzer));
    }
    Ok(Box::new(http::HttpAnalyzer::new(&config.api)?))
}
