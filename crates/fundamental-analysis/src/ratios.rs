use analysis_core::StatementPeriod;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Ratios derived from a single reporting period. Fractions, not percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRatios {
    pub date: NaiveDate,
    pub gross_margin: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub asset_turnover: Option<f64>,
    pub roe: Option<f64>,
    pub current_ratio: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub pb_ratio: Option<f64>,
    /// net margin × asset turnover × (1 + liabilities / equity)
    pub dupont_roe: Option<f64>,
}

/// `numerator / denominator`, or `None` when either side is missing or the
/// denominator is zero.
pub fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 && n.is_finite() && d.is_finite() => Some(n / d),
        _ => None,
    }
}

impl PeriodRatios {
    pub fn from_period(period: &StatementPeriod) -> Self {
        let net_margin = safe_ratio(period.net_income, period.revenue);
        let asset_turnover = safe_ratio(period.revenue, period.total_assets);
        let leverage = safe_ratio(period.total_liabilities, period.total_stockholders_equity);
        let dupont_roe = match (net_margin, asset_turnover, leverage) {
            (Some(m), Some(t), Some(l)) => Some(m * t * (1.0 + l)),
            _ => None,
        };

        Self {
            date: period.date,
            gross_margin: safe_ratio(period.gross_profit, period.revenue),
            operating_margin: safe_ratio(period.operating_income, period.revenue),
            net_margin,
            asset_turnover,
            roe: safe_ratio(period.net_income, period.total_stockholders_equity),
            current_ratio: safe_ratio(period.total_current_assets, period.total_current_liabilities),
            pe_ratio: safe_ratio(period.market_cap, period.net_income),
            pb_ratio: safe_ratio(period.market_cap, period.total_stockholders_equity),
            dupont_roe,
        }
    }
}

/// Ratios for every period, in the same order as the input.
pub fn period_ratios(periods: &[StatementPeriod]) -> Vec<PeriodRatios> {
    periods.iter().map(PeriodRatios::from_period).collect()
}
