use analysis_core::stats::{mean_pct_change, round2, round_to};
use analysis_core::{
    AnalysisError, DcfValuation, Efficiency, FinancialHealth, Profitability, StatementPeriod,
    ValuationResult,
};

pub mod config;
pub mod dcf;
pub mod ratios;

pub use config::{ValuationConfig, MAX_FORECAST_YEARS};
pub use dcf::{project_dcf, DcfProjection};
pub use ratios::{period_ratios, safe_ratio, PeriodRatios};

/// Growth, margin and DCF valuation over a symbol's statement history.
pub struct ValuationEngine {
    config: ValuationConfig,
}

impl ValuationEngine {
    pub fn new(config: ValuationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValuationConfig {
        &self.config
    }

    /// Value `symbol` at its latest reporting period.
    ///
    /// Periods may arrive in any order; they are sorted newest first before anything
    /// is computed. Growth rates are taken over the chronological series.
    pub fn analyze(
        &self,
        symbol: &str,
        periods: &[StatementPeriod],
    ) -> Result<ValuationResult, AnalysisError> {
        self.config.validate()?;
        if periods.len() < 2 {
            return Err(AnalysisError::InsufficientData(format!(
                "{}: need at least 2 reporting periods, got {}",
                symbol,
                periods.len()
            )));
        }

        let mut ordered = periods.to_vec();
        ordered.sort_by(|a, b| b.date.cmp(&a.date));
        let latest = &ordered[0];

        let revenue = chronological(symbol, &ordered, "revenue", |p| p.revenue)?;
        let net_income = chronological(symbol, &ordered, "netIncome", |p| p.net_income)?;
        let fcf = chronological(
            symbol,
            &ordered,
            "operatingCashFlow/capitalExpenditure",
            StatementPeriod::free_cash_flow,
        )?;

        let revenue_growth = mean_growth(symbol, "revenue", &revenue)? * 100.0;
        let net_income_growth = mean_growth(symbol, "netIncome", &net_income)? * 100.0;
        let fcf_growth = mean_growth(symbol, "free cash flow", &fcf)?;

        let latest_fcf = fcf[fcf.len() - 1];
        let projection = project_dcf(latest_fcf, fcf_growth, &self.config)?;

        let total_debt = required(symbol, latest.total_debt, "totalDebt")?;
        let cash = required(symbol, latest.cash_and_cash_equivalents, "cashAndCashEquivalents")?;
        let equity_value = projection.enterprise_value - total_debt + cash;

        let market_cap = required(symbol, latest.market_cap, "marketCap")?;
        let price = required(symbol, latest.price, "price")?;
        if price <= 0.0 {
            return Err(AnalysisError::CalculationError(format!(
                "{}: price must be positive, got {}",
                symbol, price
            )));
        }
        let shares_outstanding = market_cap / price;
        if !(shares_outstanding > 0.0 && shares_outstanding.is_finite()) {
            return Err(AnalysisError::CalculationError(format!(
                "{}: shares outstanding must be positive, got {}",
                symbol, shares_outstanding
            )));
        }
        let intrinsic_value = equity_value / shares_outstanding;

        let latest_revenue = nonzero(symbol, latest.revenue, "revenue")?;
        let gross_margin = required(symbol, latest.gross_profit, "grossProfit")? / latest_revenue;
        let operating_margin =
            required(symbol, latest.operating_income, "operatingIncome")? / latest_revenue;
        let latest_net_income = required(symbol, latest.net_income, "netIncome")?;
        let net_margin = latest_net_income / latest_revenue;
        let asset_turnover = latest_revenue / nonzero(symbol, latest.total_assets, "totalAssets")?;
        let current_ratio = required(symbol, latest.total_current_assets, "totalCurrentAssets")?
            / nonzero(symbol, latest.total_current_liabilities, "totalCurrentLiabilities")?;

        let equity = required(symbol, latest.total_stockholders_equity, "totalStockholdersEquity")?;
        let roe = (equity != 0.0).then(|| round2(latest_net_income / equity * 100.0));
        let debt_to_equity = if equity > 0.0 {
            Some(round2(
                required(symbol, latest.total_liabilities, "totalLiabilities")? / equity,
            ))
        } else {
            None
        };

        tracing::debug!(
            "{}: fcf_growth={:.4} ev={:.2} equity={:.2} shares={:.2}",
            symbol,
            fcf_growth,
            projection.enterprise_value,
            equity_value,
            shares_outstanding
        );

        Ok(ValuationResult {
            symbol: symbol.to_string(),
            as_of: latest.date,
            revenue_growth: round2(revenue_growth),
            net_income_growth: round2(net_income_growth),
            dcf_valuation: DcfValuation {
                intrinsic_value: round2(intrinsic_value),
                enterprise_value: round2(projection.enterprise_value),
                equity_value: round2(equity_value),
                shares_outstanding: round2(shares_outstanding),
                wacc: self.config.wacc,
                terminal_growth: self.config.terminal_growth,
                forecast_years: self.config.forecast_years,
                fcf_growth: round2(fcf_growth * 100.0),
                forecast_fcf: projection.forecast_fcf.iter().map(|v| round2(*v)).collect(),
                discount_factors: projection.discount_factors.iter().map(|v| round_to(*v, 4)).collect(),
                discounted_cash_flows: projection
                    .discounted_cash_flows
                    .iter()
                    .map(|v| round2(*v))
                    .collect(),
                terminal_value: round2(projection.terminal_value),
                discounted_terminal_value: round2(projection.discounted_terminal_value),
            },
            profitability: Profitability {
                gross_margin: round2(gross_margin * 100.0),
                operating_margin: round2(operating_margin * 100.0),
                net_margin: round2(net_margin * 100.0),
                roe,
            },
            efficiency: Efficiency {
                asset_turnover: round2(asset_turnover),
                current_ratio: round2(current_ratio),
            },
            financial_health: FinancialHealth { debt_to_equity },
        })
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new(ValuationConfig::default())
    }
}

/// Mean period-over-period fractional change of a chronological series.
pub fn mean_growth(symbol: &str, column: &str, series: &[f64]) -> Result<f64, AnalysisError> {
    mean_pct_change(series).ok_or_else(|| {
        AnalysisError::CalculationError(format!(
            "{}: {} growth undefined (zero base or fewer than 2 points)",
            symbol, column
        ))
    })
}

/// Extract a column oldest-first from newest-first periods. Every period must carry it.
fn chronological(
    symbol: &str,
    newest_first: &[StatementPeriod],
    column: &str,
    accessor: impl Fn(&StatementPeriod) -> Option<f64>,
) -> Result<Vec<f64>, AnalysisError> {
    newest_first
        .iter()
        .rev()
        .map(|p| {
            accessor(p).ok_or_else(|| {
                AnalysisError::MissingField(format!("{}: {} missing for {}", symbol, column, p.date))
            })
        })
        .collect()
}

fn required(symbol: &str, value: Option<f64>, column: &str) -> Result<f64, AnalysisError> {
    value.ok_or_else(|| AnalysisError::MissingField(format!("{}: {}", symbol, column)))
}

fn nonzero(symbol: &str, value: Option<f64>, column: &str) -> Result<f64, AnalysisError> {
    let v = required(symbol, value, column)?;
    if v == 0.0 {
        return Err(AnalysisError::CalculationError(format!("{}: {} is zero", symbol, column)));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn period(value: Value) -> StatementPeriod {
        match value {
            Value::Object(map) => StatementPeriod::from_record("ACME", map).unwrap(),
            _ => panic!("expected object"),
        }
    }

    /// Four annual periods, newest first. FCF grows exactly 10% a year.
    fn sample_periods() -> Vec<StatementPeriod> {
        vec![
            period(json!({
                "date": "2024-12-31", "revenue": 1452.0, "grossProfit": 580.8,
                "operatingIncome": 290.4, "netIncome": 108.0, "totalAssets": 2904.0,
                "totalLiabilities": 1704.0, "totalStockholdersEquity": 1200.0,
                "totalCurrentAssets": 600.0, "totalCurrentLiabilities": 400.0,
                "totalDebt": 500.0, "cashAndCashEquivalents": 200.0,
                "operatingCashFlow": 260.0, "capitalExpenditure": 126.9,
                "marketCap": 10000.0, "price": 50.0
            })),
            period(json!({
                "date": "2023-12-31", "revenue": 1210.0, "netIncome": 90.0,
                "operatingCashFlow": 250.0, "capitalExpenditure": 129.0
            })),
            period(json!({
                "date": "2022-12-31", "revenue": 1100.0, "netIncome": 120.0,
                "operatingCashFlow": 230.0, "capitalExpenditure": 120.0
            })),
            period(json!({
                "date": "2021-12-31", "revenue": 1000.0, "netIncome": 100.0,
                "operatingCashFlow": 200.0, "capitalExpenditure": 100.0
            })),
        ]
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "expected {}, got {}", expected, actual);
    }

    #[test]
    fn test_growth_is_mean_of_period_changes() {
        let result = ValuationEngine::default().analyze("ACME", &sample_periods()).unwrap();

        // revenue: +10%, +10%, +20%; net income: +20%, -25%, +20%
        let revenue_expected = (0.10 + 0.10 + 0.20) / 3.0 * 100.0;
        let net_income_expected = (0.20 - 0.25 + 0.20) / 3.0 * 100.0;
        assert_close(result.revenue_growth, round2(revenue_expected));
        assert_close(result.net_income_growth, round2(net_income_expected));
        assert_close(result.revenue_growth, 13.33);
        assert_close(result.net_income_growth, 5.0);
    }

    #[test]
    fn test_dcf_matches_reference_values() {
        let result = ValuationEngine::default().analyze("ACME", &sample_periods()).unwrap();
        let dcf = &result.dcf_valuation;

        assert_close(dcf.fcf_growth, 10.0);
        assert_eq!(dcf.forecast_years, 3);
        assert_eq!(dcf.forecast_fcf.len(), 3);
        for (actual, expected) in dcf.forecast_fcf.iter().zip([146.41, 161.05, 177.16]) {
            assert_close(*actual, expected);
        }
        for (actual, expected) in dcf.discount_factors.iter().zip([0.9259, 0.8573, 0.7938]) {
            assert_close(*actual, expected);
        }
        for (actual, expected) in dcf.discounted_cash_flows.iter().zip([135.56, 138.08, 140.63]) {
            assert_close(*actual, expected);
        }
        assert_close(dcf.terminal_value, 3649.42);
        assert_close(dcf.discounted_terminal_value, 2897.02);
        assert_close(dcf.enterprise_value, 3311.3);
        // equity = EV - debt 500 + cash 200; shares = 10000 / 50
        assert_close(dcf.equity_value, 3011.3);
        assert_close(dcf.shares_outstanding, 200.0);
        assert_close(dcf.intrinsic_value, 15.06);
    }

    #[test]
    fn test_latest_period_ratios() {
        let result = ValuationEngine::default().analyze("ACME", &sample_periods()).unwrap();

        assert_eq!(result.symbol, "ACME");
        assert_eq!(result.as_of.to_string(), "2024-12-31");
        assert_close(result.profitability.gross_margin, 40.0);
        assert_close(result.profitability.operating_margin, 20.0);
        assert_close(result.profitability.net_margin, 7.44);
        assert_close(result.profitability.roe.unwrap(), 9.0);
        assert_close(result.efficiency.asset_turnover, 0.5);
        assert_close(result.efficiency.current_ratio, 1.5);
        assert_close(result.financial_health.debt_to_equity.unwrap(), 1.42);
    }

    #[test]
    fn test_result_uses_requested_symbol() {
        let mut periods = sample_periods();
        for p in &mut periods {
            p.symbol = "BRK-B".to_string();
        }
        let result = ValuationEngine::default().analyze("BRK.B", &periods).unwrap();
        assert_eq!(result.symbol, "BRK.B");
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let mut shuffled = sample_periods();
        shuffled.swap(0, 3);
        shuffled.swap(1, 2);

        let engine = ValuationEngine::default();
        let a = engine.analyze("ACME", &sample_periods()).unwrap();
        let b = engine.analyze("ACME", &shuffled).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_non_positive_equity_has_no_debt_to_equity() {
        let mut periods = sample_periods();
        periods[0].total_stockholders_equity = Some(-250.0);

        let result = ValuationEngine::default().analyze("ACME", &periods).unwrap();
        assert!(result.financial_health.debt_to_equity.is_none());
        assert!(result.profitability.roe.is_some());

        periods[0].total_stockholders_equity = Some(0.0);
        let result = ValuationEngine::default().analyze("ACME", &periods).unwrap();
        assert!(result.financial_health.debt_to_equity.is_none());
        assert!(result.profitability.roe.is_none());
    }

    #[test]
    fn test_missing_price_fails() {
        let mut periods = sample_periods();
        periods[0].price = None;
        let err = ValuationEngine::default().analyze("ACME", &periods).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingField(_)));

        periods[0].price = Some(0.0);
        let err = ValuationEngine::default().analyze("ACME", &periods).unwrap_err();
        assert!(matches!(err, AnalysisError::CalculationError(_)));
    }

    #[test]
    fn test_missing_cash_flow_column_fails() {
        let mut periods = sample_periods();
        periods[2].operating_cash_flow = None;
        let err = ValuationEngine::default().analyze("ACME", &periods).unwrap_err();
        assert!(matches!(err, AnalysisError::MissingField(_)));
    }

    #[test]
    fn test_zero_revenue_base_fails() {
        let mut periods = sample_periods();
        periods[3].revenue = Some(0.0);
        let err = ValuationEngine::default().analyze("ACME", &periods).unwrap_err();
        assert!(matches!(err, AnalysisError::CalculationError(_)));
    }

    #[test]
    fn test_single_period_is_insufficient() {
        let periods = sample_periods();
        let err = ValuationEngine::default().analyze("ACME", &periods[..1]).unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData(_)));
    }

    #[test]
    fn test_config_flows_into_result() {
        let config = ValuationConfig {
            wacc: 0.10,
            terminal_growth: 0.02,
            forecast_years: 5,
        };
        let result = ValuationEngine::new(config).analyze("ACME", &sample_periods()).unwrap();
        assert_eq!(result.dcf_valuation.wacc, 0.10);
        assert_eq!(result.dcf_valuation.terminal_growth, 0.02);
        assert_eq!(result.dcf_valuation.forecast_fcf.len(), 5);
    }
}
