use analysis_core::AnalysisError;

use crate::ValuationConfig;

/// Unrounded DCF projection from a starting free cash flow.
#[derive(Debug, Clone, PartialEq)]
pub struct DcfProjection {
    pub forecast_fcf: Vec<f64>,
    pub discount_factors: Vec<f64>,
    pub discounted_cash_flows: Vec<f64>,
    pub terminal_value: f64,
    pub discounted_terminal_value: f64,
    pub enterprise_value: f64,
}

/// Project `latest_fcf` forward at `growth` for the configured horizon, add a Gordon
/// growth terminal value, and discount everything back at wacc.
pub fn project_dcf(
    latest_fcf: f64,
    growth: f64,
    config: &ValuationConfig,
) -> Result<DcfProjection, AnalysisError> {
    config.validate()?;
    if !latest_fcf.is_finite() || !growth.is_finite() {
        return Err(AnalysisError::CalculationError(format!(
            "non-finite DCF input (fcf {}, growth {})",
            latest_fcf, growth
        )));
    }

    let years = i32::try_from(config.forecast_years).map_err(|_| {
        AnalysisError::InvalidConfig(format!("forecast horizon {} out of range", config.forecast_years))
    })?;
    let forecast_fcf: Vec<f64> = (1..=years)
        .map(|i| latest_fcf * (1.0 + growth).powi(i))
        .collect();
    let discount_factors: Vec<f64> = (1..=years)
        .map(|i| 1.0 / (1.0 + config.wacc).powi(i))
        .collect();
    let discounted_cash_flows: Vec<f64> = forecast_fcf
        .iter()
        .zip(&discount_factors)
        .map(|(fcf, factor)| fcf * factor)
        .collect();

    let last_fcf = forecast_fcf.last().copied().unwrap_or(latest_fcf);
    let terminal_value =
        last_fcf * (1.0 + config.terminal_growth) / (config.wacc - config.terminal_growth);
    let discounted_terminal_value = terminal_value / (1.0 + config.wacc).powi(years);
    let enterprise_value = discounted_cash_flows.iter().sum::<f64>() + discounted_terminal_value;

    Ok(DcfProjection {
        forecast_fcf,
        discount_factors,
        discounted_cash_flows,
        terminal_value,
        discounted_terminal_value,
        enterprise_value,
    })
}
