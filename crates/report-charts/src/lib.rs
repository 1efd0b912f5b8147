//! Six-panel PNG report for a valued company.

use analysis_core::{AnalysisError, ReportRenderer, StatementPeriod, ValuationResult};
use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

pub mod data;
mod panels;

pub use data::{format_currency, padded_range, AxisCurrency, ReportData, Series};

pub const DEFAULT_WIDTH: u32 = 1800;
pub const DEFAULT_HEIGHT: u32 = 1200;

/// Renders reports with the plotters bitmap backend.
#[derive(Debug, Clone, Copy)]
pub struct PlottersRenderer {
    width: u32,
    height: u32,
}

impl PlottersRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn draw(&self, path: &Path, data: &ReportData) -> Result<()> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let body = root.titled(&data.title, ("sans-serif", 32))?;

        let areas = body.split_evenly((3, 2));
        panels::revenue(&areas[0], data)?;
        panels::margins(&areas[1], data)?;
        panels::income(&areas[2], data)?;
        panels::multiples(&areas[3], data)?;
        panels::dupont(&areas[4], data)?;
        panels::dcf(&areas[5], data)?;

        root.present()?;
        Ok(())
    }
}

impl Default for PlottersRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

impl ReportRenderer for PlottersRenderer {
    fn render(
        &self,
        path: &Path,
        periods: &[StatementPeriod],
        valuation: &ValuationResult,
    ) -> Result<(), AnalysisError> {
        if periods.is_empty() {
            return Err(AnalysisError::RenderError(format!(
                "{}: no periods to chart",
                valuation.symbol
            )));
        }

        let data = ReportData::build(periods, valuation);
        self.draw(path, &data)
            .map_err(|e| AnalysisError::RenderError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!("Rendered chart to {}", path.display());
        Ok(())
    }
}
