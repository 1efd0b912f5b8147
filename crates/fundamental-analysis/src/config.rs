use analysis_core::AnalysisError;
use serde::{Deserialize, Serialize};

/// Longest explicit forecast horizon accepted, in years.
pub const MAX_FORECAST_YEARS: usize = 50;

/// Discount-rate assumptions for the DCF model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationConfig {
    /// Weighted average cost of capital, as a fraction
    pub wacc: f64,
    /// Perpetual growth after the forecast horizon, as a fraction
    pub terminal_growth: f64,
    /// Number of explicitly forecast years
    pub forecast_years: usize,
}

impl Default for ValuationConfig {
    fn default() -> Self {
        Self {
            wacc: 0.08,
            terminal_growth: 0.03,
            forecast_years: 3,
        }
    }
}

impl ValuationConfig {
    /// The Gordon growth terminal value is only defined for wacc > terminal growth.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if !self.wacc.is_finite() || !self.terminal_growth.is_finite() {
            return Err(AnalysisError::InvalidConfig(
                "wacc and terminal growth must be finite".to_string(),
            ));
        }
        if self.wacc <= self.terminal_growth {
            return Err(AnalysisError::InvalidConfig(format!(
                "wacc ({}) must exceed terminal growth ({})",
                self.wacc, self.terminal_growth
            )));
        }
        if self.wacc <= -1.0 {
            return Err(AnalysisError::InvalidConfig(format!("wacc ({}) must be above -100%", self.wacc)));
        }
        if self.forecast_years == 0 {
            return Err(AnalysisError::InvalidConfig(
                "forecast horizon must be at least one year".to_string(),
            ));
        }
        if self.forecast_years > MAX_FORECAST_YEARS {
            return Err(AnalysisError::InvalidConfig(format!(
                "forecast horizon ({}) exceeds {} years",
                self.forecast_years, MAX_FORECAST_YEARS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ValuationConfig::default();
        assert_eq!(config.wacc, 0.08);
        assert_eq!(config.terminal_growth, 0.03);
        assert_eq!(config.forecast_years, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_wacc_below_terminal_growth() {
        let config = ValuationConfig {
            wacc: 0.03,
            terminal_growth: 0.03,
            forecast_years: 3,
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_empty_horizon() {
        let config = ValuationConfig {
            forecast_years: 0,
            ..ValuationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_oversized_horizon() {
        let config = ValuationConfig {
            forecast_years: usize::MAX,
            ..ValuationConfig::default()
        };
        assert!(matches!(config.validate(), Err(AnalysisError::InvalidConfig(_))));

        let config = ValuationConfig {
            forecast_years: MAX_FORECAST_YEARS,
            ..ValuationConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
