use analysis_core::{AnalysisError, CompanyProfile, StatementPeriod, StatementSource};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

pub mod envelope;
pub mod join;
pub mod screener;

pub use envelope::Record;
pub use join::join_statements;
pub use screener::{NasdaqScreener, DEFAULT_SCREENER_URL};

pub const BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// Financial Modeling Prep client for company profiles and financial statements.
#[derive(Clone)]
pub struct FmpClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl FmpClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// GET `{base}/{endpoint}/{symbol}?apikey=...` and decode the body as JSON.
    async fn get_json(&self, endpoint: &str, symbol: &str) -> Result<Value, AnalysisError> {
        let url = format!("{}/{}/{}", self.base_url, endpoint, symbol);
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("apikey", &self.api_key)])
            .send()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("{} {}: {}", endpoint, symbol, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::ApiError(format!(
                "{} {}: HTTP {}: {}",
                endpoint,
                symbol,
                status,
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AnalysisError::UnsupportedShape(format!("{} {}: {}", endpoint, symbol, e)))
    }

    async fn get_statements(&self, endpoint: &str, symbol: &str) -> Result<Vec<Record>, AnalysisError> {
        let body = self.get_json(endpoint, symbol).await?;
        envelope::parse_statements(endpoint, body)
    }

    /// Get the company profile (market cap and price)
    pub async fn get_profile(&self, symbol: &str) -> Result<Option<CompanyProfile>, AnalysisError> {
        let body = self.get_json("profile", symbol).await?;
        envelope::parse_profile(symbol, body)
    }

    /// Get income statements, newest first as returned by the API
    pub async fn get_income_statements(&self, symbol: &str) -> Result<Vec<Record>, AnalysisError> {
        self.get_statements("income-statement", symbol).await
    }

    /// Get balance sheet statements, newest first as returned by the API
    pub async fn get_balance_sheets(&self, symbol: &str) -> Result<Vec<Record>, AnalysisError> {
        self.get_statements("balance-sheet-statement", symbol).await
    }

    /// Get cash flow statements (operating cash flow and capital expenditure)
    pub async fn get_cash_flow_statements(&self, symbol: &str) -> Result<Vec<Record>, AnalysisError> {
        self.get_statements("cash-flow-statement", symbol).await
    }
}

#[async_trait]
impl StatementSource for FmpClient {
    async fn fetch_statements(&self, symbol: &str) -> Result<Vec<StatementPeriod>, AnalysisError> {
        tracing::info!("Downloading {} financial statements", symbol);

        let profile = self.get_profile(symbol).await?;
        if profile.is_none() {
            tracing::warn!("{}: empty company profile, market cap unavailable", symbol);
        }

        let income = self.get_income_statements(symbol).await?;
        tracing::info!("{}: {} income statements", symbol, income.len());

        let balance = self.get_balance_sheets(symbol).await?;
        tracing::info!("{}: {} balance sheets", symbol, balance.len());

        let cash_flow = match self.get_cash_flow_statements(symbol).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("{}: cash flow statements unavailable: {}", symbol, e);
                Vec::new()
            }
        };

        let periods = join_statements(symbol, income, balance, cash_flow, profile.as_ref());
        tracing::info!("{}: {} joined periods", symbol, periods.len());
        Ok(periods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount(server: &MockServer, endpoint: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .and(query_param("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_statements_joins_all_sources() {
        let server = MockServer::start().await;
        mount(&server, "/profile/ACME", json!([{"symbol": "ACME", "mktCap": 1.0e9, "price": 25.0}])).await;
        mount(
            &server,
            "/income-statement/ACME",
            json!([
                {"date": "2024-12-31", "symbol": "ACME", "revenue": 500.0, "netIncome": 50.0},
                {"date": "2023-12-31", "symbol": "ACME", "revenue": 400.0, "netIncome": 40.0}
            ]),
        )
        .await;
        mount(
            &server,
            "/balance-sheet-statement/ACME",
            json!([
                {"date": "2024-12-31", "totalAssets": 1000.0},
                {"date": "2023-12-31", "totalAssets": 900.0}
            ]),
        )
        .await;
        mount(
            &server,
            "/cash-flow-statement/ACME",
            json!([{"date": "2024-12-31", "operatingCashFlow": 80.0, "capitalExpenditure": 30.0}]),
        )
        .await;

        let client = FmpClient::with_base_url("test-key".to_string(), server.uri());
        let periods = client.fetch_statements("ACME").await.unwrap();

        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].revenue, Some(500.0));
        assert_eq!(periods[0].total_assets, Some(1000.0));
        assert_eq!(periods[0].market_cap, Some(1.0e9));
        assert_eq!(periods[0].price, Some(25.0));
        assert_eq!(periods[0].free_cash_flow(), Some(50.0));
        assert!(periods[1].operating_cash_flow.is_none());
    }

    #[tokio::test]
    async fn test_missing_cash_flow_is_tolerated() {
        let server = MockServer::start().await;
        mount(&server, "/profile/ACME", json!([])).await;
        mount(&server, "/income-statement/ACME", json!([{"date": "2024-12-31"}])).await;
        mount(&server, "/balance-sheet-statement/ACME", json!([{"date": "2024-12-31"}])).await;
        Mock::given(method("GET"))
            .and(path("/cash-flow-statement/ACME"))
            .respond_with(ResponseTemplate::new(403).set_body_string("plan limit"))
            .mount(&server)
            .await;

        let client = FmpClient::with_base_url("test-key".to_string(), server.uri());
        let periods = client.fetch_statements("ACME").await.unwrap();

        assert_eq!(periods.len(), 1);
        assert!(periods[0].market_cap.is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/profile/ACME"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API KEY"))
            .mount(&server)
            .await;

        let client = FmpClient::with_base_url("test-key".to_string(), server.uri());
        let err = client.fetch_statements("ACME").await.unwrap_err();

        match err {
            AnalysisError::ApiError(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("Invalid API KEY"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_envelope_fails_statement_fetch() {
        let server = MockServer::start().await;
        mount(&server, "/profile/ACME", json!([{"mktCap": 1.0, "price": 1.0}])).await;
        mount(
            &server,
            "/income-statement/ACME",
            json!({"Error Message": "Limit Reach"}),
        )
        .await;

        let client = FmpClient::with_base_url("test-key".to_string(), server.uri());
        let err = client.fetch_statements("ACME").await.unwrap_err();

        assert_eq!(
            err,
            AnalysisError::ApiError("income-statement: Limit Reach".to_string())
        );
    }
}
