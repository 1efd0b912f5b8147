use anyhow::{Context, Result};
use fmp_client::DEFAULT_SCREENER_URL;
use fundamental_analysis::ValuationConfig;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_ANALYSIS_DIR: &str = "analysis";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub fmp_api_key: String,
    pub fmp_base_url: String,
    pub screener_url: String,
    /// Output directory unless `--output-dir` overrides it
    pub analysis_dir: PathBuf,
    pub valuation: ValuationConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset keys take their defaults.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = ValuationConfig::default();

        let config = Self {
            fmp_api_key: get("FMP_API_KEY").context("FMP_API_KEY not set")?,
            fmp_base_url: get("FMP_BASE_URL").unwrap_or_else(|| fmp_client::BASE_URL.to_string()),
            screener_url: get("NASDAQ_SCREENER_URL")
                .unwrap_or_else(|| DEFAULT_SCREENER_URL.to_string()),
            analysis_dir: get("ANALYSIS_DIR")
                .unwrap_or_else(|| DEFAULT_ANALYSIS_DIR.to_string())
                .into(),
            valuation: ValuationConfig {
                wacc: parse_or(&get, "VALUATION_WACC", defaults.wacc)?,
                terminal_growth: parse_or(&get, "VALUATION_TERMINAL_GROWTH", defaults.terminal_growth)?,
                forecast_years: parse_or(&get, "VALUATION_FORECAST_YEARS", defaults.forecast_years)?,
            },
        };

        config.valuation.validate()?;
        Ok(config)
    }
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid {}: {:?}", key, raw)),
        None => Ok(default),
    }
}
