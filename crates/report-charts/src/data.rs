use analysis_core::{StatementPeriod, ValuationResult};
use fundamental_analysis::PeriodRatios;
use std::ops::Range;

/// A named series over period indices. Points are `(index, value)`; periods
/// without a value are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: &'static str,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    fn collect(label: &'static str, values: impl Iterator<Item = Option<f64>>) -> Self {
        let points = values
            .enumerate()
            .filter_map(|(i, v)| v.filter(|v| v.is_finite()).map(|v| (i as f64, v)))
            .collect();
        Self { label, points }
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|(_, v)| *v)
    }
}

/// Everything the six panels plot, oldest period first.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportData {
    pub title: String,
    pub dates: Vec<String>,
    pub revenue: Series,
    pub margins: Vec<Series>,
    pub operating_income: Series,
    pub net_income: Series,
    pub multiples: Vec<Series>,
    pub dupont: Vec<Series>,
    pub forecast_fcf: Vec<f64>,
    pub discounted_cash_flows: Vec<f64>,
    pub discounted_terminal_value: f64,
}

fn pct(v: Option<f64>) -> Option<f64> {
    v.map(|v| v * 100.0)
}

impl ReportData {
    pub fn build(periods: &[StatementPeriod], valuation: &ValuationResult) -> Self {
        let mut ordered: Vec<&StatementPeriod> = periods.iter().collect();
        ordered.sort_by_key(|p| p.date);
        let ratios: Vec<PeriodRatios> = ordered.iter().map(|p| PeriodRatios::from_period(p)).collect();

        let dcf = &valuation.dcf_valuation;

        Self {
            title: format!(
                "{} Financial Analysis Report | DCF Intrinsic Value: ${:.2}",
                valuation.symbol, dcf.intrinsic_value
            ),
            dates: ordered.iter().map(|p| p.date.format("%Y-%m-%d").to_string()).collect(),
            revenue: Series::collect("Revenue", ordered.iter().map(|p| p.revenue)),
            margins: vec![
                Series::collect("Gross Margin", ratios.iter().map(|r| pct(r.gross_margin))),
                Series::collect("Operating Margin", ratios.iter().map(|r| pct(r.operating_margin))),
                Series::collect("Net Margin", ratios.iter().map(|r| pct(r.net_margin))),
            ],
            operating_income: Series::collect(
                "Operating Income",
                ordered.iter().map(|p| p.operating_income),
            ),
            net_income: Series::collect("Net Income", ordered.iter().map(|p| p.net_income)),
            multiples: vec![
                Series::collect("P/E Ratio", ratios.iter().map(|r| r.pe_ratio)),
                Series::collect("P/B Ratio", ratios.iter().map(|r| r.pb_ratio)),
            ],
            dupont: vec![
                Series::collect("Net Margin", ratios.iter().map(|r| pct(r.net_margin))),
                Series::collect("ROE", ratios.iter().map(|r| pct(r.roe))),
                Series::collect("DuPont ROE", ratios.iter().map(|r| pct(r.dupont_roe))),
            ],
            forecast_fcf: dcf.forecast_fcf.clone(),
            discounted_cash_flows: dcf.discounted_cash_flows.clone(),
            discounted_terminal_value: dcf.discounted_terminal_value,
        }
    }

    /// Label for an x-axis index, empty between periods.
    pub fn date_label(&self, x: f64) -> String {
        let rounded = x.round();
        if (x - rounded).abs() > 1e-6 || rounded < 0.0 {
            return String::new();
        }
        self.dates.get(rounded as usize).cloned().unwrap_or_default()
    }

    pub fn x_range(&self) -> Range<f64> {
        -0.5..(self.dates.len().max(1) as f64 - 0.5)
    }
}

fn currency_unit(magnitude: f64) -> (f64, &'static str) {
    if magnitude >= 1e9 {
        (1e9, "B")
    } else if magnitude >= 1e6 {
        (1e6, "M")
    } else if magnitude >= 1e3 {
        (1e3, "K")
    } else {
        (1.0, "")
    }
}

fn scaled_currency(value: f64, divisor: f64, suffix: &str, decimals: usize) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${:.*}{}", sign, decimals, value.abs() / divisor, suffix)
}

/// `$1.2B`, `$350.0M`, `$12.5K`, `$42.00`.
pub fn format_currency(value: f64) -> String {
    let (divisor, suffix) = currency_unit(value.abs());
    let decimals = if suffix.is_empty() { 2 } else { 1 };
    scaled_currency(value, divisor, suffix, decimals)
}

/// Currency tick labels for one axis: a single unit for every tick, with enough
/// decimals that neighbouring ticks stay distinct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisCurrency {
    divisor: f64,
    suffix: &'static str,
    decimals: usize,
}

impl AxisCurrency {
    /// Plotters places roughly ten ticks on a 1-2-5 step.
    pub fn for_range(range: &Range<f64>) -> Self {
        let (divisor, suffix) = currency_unit(range.start.abs().max(range.end.abs()));
        let step = (range.end - range.start) / 10.0 / divisor;
        let needed = if step > 0.0 && step.is_finite() {
            (-step.log10() - 1e-9).ceil().max(0.0) as usize
        } else {
            0
        };
        let floor = if suffix.is_empty() { 2 } else { 1 };
        Self {
            divisor,
            suffix,
            decimals: needed.clamp(floor, 6),
        }
    }

    pub fn label(&self, value: f64) -> String {
        scaled_currency(value, self.divisor, self.suffix, self.decimals)
    }
}

/// Y range covering `values` with 10% headroom. When `include_zero` is set the
/// range always reaches zero so bars have a baseline.
pub fn padded_range(values: impl IntoIterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut lo, mut hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for v in values.into_iter().filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !lo.is_finite() {
        return 0.0..1.0;
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if hi == lo {
        let pad = if hi == 0.0 { 1.0 } else { hi.abs() * 0.1 };
        return (lo - pad)..(hi + pad);
    }
    let pad = (hi - lo) * 0.1;
    let lo = if include_zero && lo == 0.0 { 0.0 } else { lo - pad };
    lo..(hi + pad)
}
