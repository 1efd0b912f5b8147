use analysis_core::AnalysisError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MERGED_FILE: &str = "all_companies_financials.csv";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeReport {
    pub files: usize,
    pub rows: usize,
    pub columns: usize,
}

/// Concatenate every `*.csv` in `input_dir` (by file name) into `output`.
///
/// Inputs are decoded as Latin-1. The output header is the union of input headers in
/// first-seen order; cells for columns a file lacks are left empty.
pub fn merge_csv_files(input_dir: &Path, output: &Path) -> Result<MergeReport, AnalysisError> {
    let inputs = csv_files(input_dir, output)?;
    if inputs.is_empty() {
        return Err(AnalysisError::InsufficientData(format!(
            "no csv files in {}",
            input_dir.display()
        )));
    }

    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<(usize, String)>> = Vec::new();

    for path in &inputs {
        let bytes = fs::read(path)
            .map_err(|e| AnalysisError::IoError(format!("{}: {}", path.display(), e)))?;
        let text = decode_latin1(&bytes);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AnalysisError::UnsupportedShape(format!("{}: {}", path.display(), e)))?
            .clone();
        let positions: Vec<usize> = headers
            .iter()
            .map(|h| match columns.iter().position(|c| c == h) {
                Some(i) => i,
                None => {
                    columns.push(h.to_string());
                    columns.len() - 1
                }
            })
            .collect();

        let before = rows.len();
        for record in reader.records() {
            let record = record
                .map_err(|e| AnalysisError::UnsupportedShape(format!("{}: {}", path.display(), e)))?;
            rows.push(
                positions
                    .iter()
                    .zip(record.iter())
                    .map(|(i, v)| (*i, v.to_string()))
                    .collect(),
            );
        }
        tracing::debug!("Read {} rows from {}", rows.len() - before, path.display());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(output)
        .map_err(|e| AnalysisError::IoError(format!("{}: {}", output.display(), e)))?;
    writer
        .write_record(&columns)
        .map_err(|e| AnalysisError::IoError(format!("{}: {}", output.display(), e)))?;
    for cells in &rows {
        let mut line = vec![""; columns.len()];
        for (i, v) in cells {
            line[*i] = v.as_str();
        }
        writer
            .write_record(&line)
            .map_err(|e| AnalysisError::IoError(format!("{}: {}", output.display(), e)))?;
    }
    writer.flush()?;

    let report = MergeReport {
        files: inputs.len(),
        rows: rows.len(),
        columns: columns.len(),
    };
    tracing::info!(
        "Merged {} files ({} rows, {} columns) into {}",
        report.files,
        report.rows,
        report.columns,
        output.display()
    );
    Ok(report)
}

/// `*.csv` entries of `dir` sorted by name, excluding `output` itself.
fn csv_files(dir: &Path, output: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| AnalysisError::IoError(format!("{}: {}", dir.display(), e)))?;
    let output = output.canonicalize().ok();

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if !is_csv || !path.is_file() {
            continue;
        }
        if output.is_some() && path.canonicalize().ok() == output {
            tracing::debug!("Skipping merge output {}", path.display());
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Every byte maps to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
