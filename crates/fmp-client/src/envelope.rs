//! Response envelopes for the screener and statement endpoints.
//!
//! Each endpoint has a small set of known shapes. Parsing tries them in order and
//! fails with [`AnalysisError::UnsupportedShape`] when none match.

use analysis_core::{AnalysisError, CompanyProfile};
use serde::Deserialize;
use serde_json::{Map, Value};

pub type Record = Map<String, Value>;

#[derive(Debug, Deserialize)]
struct RowsData {
    rows: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct TableData {
    table: RowsData,
}

/// Screener rows live either under `data.table.rows` or directly under `data.rows`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ScreenerEnvelope {
    Table { data: TableData },
    Rows { data: RowsData },
}

impl ScreenerEnvelope {
    fn into_rows(self) -> Vec<Record> {
        match self {
            ScreenerEnvelope::Table { data } => data.table.rows,
            ScreenerEnvelope::Rows { data } => data.rows,
        }
    }
}

/// Statement endpoints return a bare array, or occasionally wrap it under `financials`.
/// FMP reports failures as an object with an `Error Message` key.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StatementEnvelope {
    Rows(Vec<Record>),
    Wrapped { financials: Vec<Record> },
    Error {
        #[serde(rename = "Error Message")]
        message: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileEntry {
    symbol: Option<String>,
    mkt_cap: Option<f64>,
    market_cap: Option<f64>,
    price: Option<f64>,
    company_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProfileEnvelope {
    Entries(Vec<ProfileEntry>),
    Error {
        #[serde(rename = "Error Message")]
        message: String,
    },
}

pub fn parse_screener(body: Value) -> Result<Vec<Record>, AnalysisError> {
    serde_json::from_value::<ScreenerEnvelope>(body)
        .map(ScreenerEnvelope::into_rows)
        .map_err(|_| {
            AnalysisError::UnsupportedShape(
                "screener response has neither data.table.rows nor data.rows".to_string(),
            )
        })
}

pub fn parse_statements(endpoint: &str, body: Value) -> Result<Vec<Record>, AnalysisError> {
    match serde_json::from_value::<StatementEnvelope>(body) {
        Ok(StatementEnvelope::Rows(rows)) => Ok(rows),
        Ok(StatementEnvelope::Wrapped { financials }) => Ok(financials),
        Ok(StatementEnvelope::Error { message }) => {
            Err(AnalysisError::ApiError(format!("{}: {}", endpoint, message)))
        }
        Err(_) => Err(AnalysisError::UnsupportedShape(format!(
            "{} response is not a list of statement records",
            endpoint
        ))),
    }
}

/// Parse a profile response. An empty list means the provider knows nothing about the
/// symbol, which is not an error.
pub fn parse_profile(symbol: &str, body: Value) -> Result<Option<CompanyProfile>, AnalysisError> {
    match serde_json::from_value::<ProfileEnvelope>(body) {
        Ok(ProfileEnvelope::Entries(entries)) => Ok(entries.into_iter().next().map(|entry| {
            CompanyProfile {
                symbol: entry.symbol.unwrap_or_else(|| symbol.to_string()),
                market_cap: entry.mkt_cap.or(entry.market_cap),
                price: entry.price,
                company_name: entry.company_name,
            }
        })),
        Ok(ProfileEnvelope::Error { message }) => {
            Err(AnalysisError::ApiError(format!("profile: {}", message)))
        }
        Err(e) => Err(AnalysisError::UnsupportedShape(format!("profile response: {}", e))),
    }
}
