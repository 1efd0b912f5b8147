//! merge-csv: combine per-company financials CSVs into one file.

use analysis_orchestrator::{merge_csv_files, DEFAULT_MERGED_FILE};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "merge-csv", version, about = "Merge every CSV in a directory into one file")]
struct Args {
    /// Directory to scan for *.csv files
    #[arg(long, default_value = "analysis")]
    input_dir: PathBuf,

    /// Combined output file
    #[arg(long, default_value = DEFAULT_MERGED_FILE)]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    valuation_cli::init_tracing("merge_csv=info,analysis_orchestrator=info");

    let args = Args::parse();
    let report = merge_csv_files(&args.input_dir, &args.output).with_context(|| {
        format!(
            "merging {} into {}",
            args.input_dir.display(),
            args.output.display()
        )
    })?;

    println!(
        "Merged {} files ({} rows, {} columns) into {}",
        report.files,
        report.rows,
        report.columns,
        args.output.display()
    );
    Ok(())
}
