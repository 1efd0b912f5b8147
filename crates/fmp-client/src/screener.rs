use analysis_core::{AnalysisError, CompanyDirectory, CompanyRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::envelope;

pub const DEFAULT_SCREENER_URL: &str =
    "https://api.nasdaq.com/api/screener/stocks?tableonly=true&limit=25&offset=0";

// The screener rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0";

/// Nasdaq stock screener, used as the company directory.
#[derive(Clone)]
pub struct NasdaqScreener {
    url: String,
    client: Client,
}

impl NasdaqScreener {
    pub fn new() -> Self {
        Self::with_url(DEFAULT_SCREENER_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            url: url.into(),
            client,
        }
    }

    /// Turn screener rows into company records, skipping rows without a symbol.
    pub fn companies_from_body(body: Value) -> Result<Vec<CompanyRecord>, AnalysisError> {
        let rows = envelope::parse_screener(body)?;
        let total = rows.len();

        let companies: Vec<CompanyRecord> = rows.into_iter().filter_map(CompanyRecord::from_row).collect();

        if total > 0 && companies.is_empty() {
            return Err(AnalysisError::MissingField(
                "screener rows carry no symbol field".to_string(),
            ));
        }
        if companies.len() < total {
            tracing::warn!("Skipped {} screener rows without a symbol", total - companies.len());
        }

        Ok(companies)
    }
}

impl Default for NasdaqScreener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompanyDirectory for NasdaqScreener {
    async fn fetch_companies(&self) -> Result<Vec<CompanyRecord>, AnalysisError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("screener: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::ApiError(format!(
                "screener: HTTP {}: {}",
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AnalysisError::UnsupportedShape(format!("screener: {}", e)))?;

        let companies = Self::companies_from_body(body)?;
        tracing::info!("Fetched {} companies from screener", companies.len());
        if let Some(first) = companies.first() {
            tracing::debug!("First company: {:?}", first);
        }
        Ok(companies)
    }
}
