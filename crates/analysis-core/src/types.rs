use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AnalysisError;

/// A listed company as returned by the screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    /// Screener market cap, kept as the display string the screener returns
    #[serde(default)]
    pub market_cap: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Every other screener column, untouched
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl CompanyRecord {
    /// Build a record from one screener row. Returns `None` when the row has no
    /// usable `symbol`.
    pub fn from_row(mut row: Map<String, Value>) -> Option<Self> {
        let symbol = match row.remove("symbol") {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => return None,
        };

        fn take_str(row: &mut Map<String, Value>, key: &str) -> Option<String> {
            match row.remove(key) {
                Some(Value::String(s)) if !s.is_empty() => Some(s),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            }
        }

        Some(Self {
            symbol,
            name: take_str(&mut row, "name"),
            sector: take_str(&mut row, "sector"),
            industry: take_str(&mut row, "industry"),
            market_cap: take_str(&mut row, "marketCap"),
            country: take_str(&mut row, "country"),
            extra: row,
        })
    }
}

/// Company profile fields needed to value equity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub market_cap: Option<f64>,
    pub price: Option<f64>,
    pub company_name: Option<String>,
}

/// One reporting period of merged income-statement and balance-sheet data.
///
/// Only built by joining an income entry and a balance entry with the same date.
/// The typed fields are read from the merged record; `raw` keeps every merged
/// column so the period can be persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementPeriod {
    pub symbol: String,
    pub date: NaiveDate,
    pub revenue: Option<f64>,
    pub gross_profit: Option<f64>,
    pub operating_income: Option<f64>,
    pub net_income: Option<f64>,
    pub total_assets: Option<f64>,
    pub total_liabilities: Option<f64>,
    pub total_stockholders_equity: Option<f64>,
    pub total_current_assets: Option<f64>,
    pub total_current_liabilities: Option<f64>,
    pub total_debt: Option<f64>,
    pub cash_and_cash_equivalents: Option<f64>,
    pub operating_cash_flow: Option<f64>,
    pub capital_expenditure: Option<f64>,
    pub market_cap: Option<f64>,
    pub price: Option<f64>,
    #[serde(skip)]
    pub raw: Map<String, Value>,
}

impl StatementPeriod {
    /// Parse a merged statement record. `symbol` fills in when the record lacks one.
    pub fn from_record(symbol: &str, mut record: Map<String, Value>) -> Result<Self, AnalysisError> {
        match record.get("date") {
            Some(Value::String(_)) => {}
            _ => return Err(AnalysisError::MissingField(format!("{}: date", symbol))),
        }
        if !matches!(record.get("symbol"), Some(Value::String(_))) {
            record.insert("symbol".to_string(), Value::String(symbol.to_string()));
        }

        let mut period: StatementPeriod = serde_json::from_value(Value::Object(record.clone()))
            .map_err(|e| AnalysisError::UnsupportedShape(format!("{} statement record: {}", symbol, e)))?;
        period.raw = record;
        Ok(period)
    }

    /// Free cash flow = operating cash flow − capital expenditure.
    pub fn free_cash_flow(&self) -> Option<f64> {
        match (self.operating_cash_flow, self.capital_expenditure) {
            (Some(ocf), Some(capex)) => Some(ocf - capex),
            _ => None,
        }
    }
}

/// Discounted-cash-flow components of a valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DcfValuation {
    pub intrinsic_value: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
    pub shares_outstanding: f64,
    pub wacc: f64,
    pub terminal_growth: f64,
    pub forecast_years: usize,
    /// Mean FCF growth, in percent
    pub fcf_growth: f64,
    pub forecast_fcf: Vec<f64>,
    pub discount_factors: Vec<f64>,
    pub discounted_cash_flows: Vec<f64>,
    pub terminal_value: f64,
    pub discounted_terminal_value: f64,
}

/// Margins in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profitability {
    pub gross_margin: f64,
    pub operating_margin: f64,
    pub net_margin: f64,
    pub roe: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Efficiency {
    pub asset_turnover: f64,
    pub current_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialHealth {
    /// `None` when stockholders' equity is not positive
    pub debt_to_equity: Option<f64>,
}

/// Valuation snapshot for one symbol at its latest reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub revenue_growth: f64,
    pub net_income_growth: f64,
    pub dcf_valuation: DcfValuation,
    pub profitability: Profitability,
    pub efficiency: Efficiency,
    pub financial_health: FinancialHealth,
}
