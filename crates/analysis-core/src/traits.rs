use async_trait::async_trait;
use std::path::Path;

use crate::{AnalysisError, CompanyRecord, StatementPeriod, ValuationResult};

/// Source of the company universe (a stock screener)
#[async_trait]
pub trait CompanyDirectory: Send + Sync {
    async fn fetch_companies(&self) -> Result<Vec<CompanyRecord>, AnalysisError>;
}

/// Source of joined statement periods for one symbol, newest first
#[async_trait]
pub trait StatementSource: Send + Sync {
    async fn fetch_statements(&self, symbol: &str) -> Result<Vec<StatementPeriod>, AnalysisError>;
}

/// Renders the per-symbol report image
pub trait ReportRenderer: Send + Sync {
    fn render(
        &self,
        path: &Path,
        periods: &[StatementPeriod],
        valuation: &ValuationResult,
    ) -> Result<(), AnalysisError>;
}
