//! fin-valuation: fetch statements, value and chart a batch of companies.
//!
//! Usage:
//!   fin-valuation                        # first 5 screener symbols
//!   fin-valuation --top 20
//!   fin-valuation --all
//!   fin-valuation --symbols AAPL MSFT -o out/

use analysis_orchestrator::{BatchOrchestrator, OutputStore, SymbolOutcome, SymbolSelection, DEFAULT_TOP};
use anyhow::Context;
use clap::Parser;
use fmp_client::{FmpClient, NasdaqScreener};
use fundamental_analysis::ValuationEngine;
use report_charts::PlottersRenderer;
use std::path::PathBuf;
use valuation_cli::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "fin-valuation", version, about = "DCF valuation reports for listed companies")]
struct Cli {
    /// Symbols to analyze; takes precedence over --all
    #[arg(short, long, num_args = 1..)]
    symbols: Vec<String>,

    /// Analyze every company the screener returns
    #[arg(short, long)]
    all: bool,

    /// Number of screener companies to analyze without --symbols or --all
    #[arg(long, default_value_t = DEFAULT_TOP)]
    top: usize,

    /// Directory for CSV, JSON and PNG outputs (default: $ANALYSIS_DIR or ./analysis)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

impl Cli {
    fn selection(&self) -> SymbolSelection {
        SymbolSelection::from_flags(self.symbols.clone(), self.all, self.top)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    valuation_cli::init_tracing("fin_valuation=info,analysis_orchestrator=info,fmp_client=warn");

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("loading configuration")?;
    let output_dir = cli.output_dir.clone().unwrap_or_else(|| config.analysis_dir.clone());

    let orchestrator = BatchOrchestrator::new(
        NasdaqScreener::with_url(config.screener_url.clone()),
        FmpClient::with_base_url(config.fmp_api_key.clone(), config.fmp_base_url.clone()),
        PlottersRenderer::default(),
        ValuationEngine::new(config.valuation),
        OutputStore::new(output_dir),
    );

    let summary = orchestrator
        .run(&cli.selection())
        .await
        .context("batch run aborted")?;

    for report in &summary.reports {
        match &report.outcome {
            SymbolOutcome::Analyzed { intrinsic_value } => {
                tracing::info!("{}: intrinsic value ${:.2}", report.symbol, intrinsic_value)
            }
            SymbolOutcome::NoData => tracing::info!("{}: no data", report.symbol),
            SymbolOutcome::Failed { stage, reason } => {
                tracing::info!("{}: failed at {} ({})", report.symbol, stage, reason)
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_selection_is_top_five() {
        let cli = Cli::try_parse_from(["fin-valuation"]).unwrap();
        assert_eq!(cli.selection(), SymbolSelection::Top(5));
        assert!(cli.output_dir.is_none());
    }

    #[test]
    fn test_symbols_win_over_all() {
        let cli = Cli::try_parse_from(["fin-valuation", "-a", "-s", "AAPL", "MSFT", "-o", "out"]).unwrap();
        assert_eq!(
            cli.selection(),
            SymbolSelection::Explicit(vec!["AAPL".to_string(), "MSFT".to_string()])
        );
        assert_eq!(cli.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_all_and_top() {
        let cli = Cli::try_parse_from(["fin-valuation", "--all"]).unwrap();
        assert_eq!(cli.selection(), SymbolSelection::All);

        let cli = Cli::try_parse_from(["fin-valuation", "--top", "12"]).unwrap();
        assert_eq!(cli.selection(), SymbolSelection::Top(12));
    }
}
