use analysis_core::{
    AnalysisError, CompanyDirectory, ReportRenderer, StatementPeriod, StatementSource,
    ValuationResult,
};
use fundamental_analysis::ValuationEngine;
use serde::Serialize;
use std::fmt;

pub mod merge;
pub mod output;
mod selection;

pub use merge::{merge_csv_files, MergeReport, DEFAULT_MERGED_FILE};
pub use output::OutputStore;
pub use selection::{resolve_symbols, SymbolSelection, DEFAULT_TOP};

/// Step of per-symbol processing at which a symbol failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Persist,
    Analyze,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Persist => "persist",
            Stage::Analyze => "analyze",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SymbolOutcome {
    /// CSV, JSON and chart were all written.
    Analyzed { intrinsic_value: f64 },
    /// The statement source returned no periods. Nothing was written.
    NoData,
    Failed { stage: Stage, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolReport {
    pub symbol: String,
    pub outcome: SymbolOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub reports: Vec<SymbolReport>,
}

impl BatchSummary {
    pub fn analyzed(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::Analyzed { .. }))
    }

    pub fn no_data(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::NoData))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SymbolOutcome::Failed { .. }))
    }

    pub fn outcome(&self, symbol: &str) -> Option<&SymbolOutcome> {
        self.reports
            .iter()
            .find(|r| r.symbol == symbol)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&SymbolOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Runs fetch, persist, valuation and chart rendering for a batch of symbols,
/// one symbol at a time.
pub struct BatchOrchestrator<D, S, R> {
    directory: D,
    source: S,
    renderer: R,
    engine: ValuationEngine,
    store: OutputStore,
}

impl<D, S, R> BatchOrchestrator<D, S, R>
where
    D: CompanyDirectory,
    S: StatementSource,
    R: ReportRenderer,
{
    pub fn new(directory: D, source: S, renderer: R, engine: ValuationEngine, store: OutputStore) -> Self {
        Self {
            directory,
            source,
            renderer,
            engine,
            store,
        }
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    /// Process every selected symbol. Only directory and output-directory failures
    /// abort the run; per-symbol failures are recorded in the summary.
    pub async fn run(&self, selection: &SymbolSelection) -> Result<BatchSummary, AnalysisError> {
        let symbols = resolve_symbols(selection, &self.directory).await?;
        self.store.ensure_dir()?;
        tracing::info!(
            "Processing {} symbols into {}",
            symbols.len(),
            self.store.dir().display()
        );

        let mut summary = BatchSummary::default();
        for (i, symbol) in symbols.iter().enumerate() {
            tracing::info!("[{}/{}] {}", i + 1, symbols.len(), symbol);
            let outcome = self.process_symbol(symbol).await;
            if let SymbolOutcome::Failed { stage, reason } = &outcome {
                tracing::warn!(symbol = %symbol, stage = %stage, "Skipping {}: {}", symbol, reason);
            }
            summary.reports.push(SymbolReport {
                symbol: symbol.clone(),
                outcome,
            });
        }

        tracing::info!(
            "Batch complete: {} analyzed, {} without data, {} failed",
            summary.analyzed(),
            summary.no_data(),
            summary.failed()
        );
        Ok(summary)
    }

    pub async fn process_symbol(&self, symbol: &str) -> SymbolOutcome {
        let periods = match self.source.fetch_statements(symbol).await {
            Ok(periods) => periods,
            Err(e) => return failed(Stage::Fetch, e),
        };
        if periods.is_empty() {
            tracing::warn!(symbol = %symbol, "No statement data for {}", symbol);
            return SymbolOutcome::NoData;
        }

        if let Err(e) = self.store.write_financials(symbol, &periods) {
            return failed(Stage::Persist, e);
        }

        let valuation = match self.engine.analyze(symbol, &periods) {
            Ok(valuation) => valuation,
            Err(e) => return failed(Stage::Analyze, e),
        };

        match self.publish(symbol, &periods, &valuation) {
            Ok(()) => SymbolOutcome::Analyzed {
                intrinsic_value: valuation.dcf_valuation.intrinsic_value,
            },
            Err(outcome) => outcome,
        }
    }

    fn publish(
        &self,
        symbol: &str,
        periods: &[StatementPeriod],
        valuation: &ValuationResult,
    ) -> Result<(), SymbolOutcome> {
        self.store
            .write_analysis(symbol, valuation)
            .map_err(|e| failed(Stage::Persist, e))?;
        self.renderer
            .render(&self.store.chart_path(symbol), periods, valuation)
            .map_err(|e| failed(Stage::Render, e))?;
        Ok(())
    }
}

fn failed(stage: Stage, error: AnalysisError) -> SymbolOutcome {
    SymbolOutcome::Failed {
        stage,
        reason: error.to_string(),
    }
}
