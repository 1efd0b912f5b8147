use analysis_core::{AnalysisError, StatementPeriod, ValuationResult};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-symbol artifacts in one output directory. Existing files are overwritten.
#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ensure_dir(&self) -> Result<(), AnalysisError> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AnalysisError::IoError(format!("create {}: {}", self.dir.display(), e))
        })
    }

    pub fn financials_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}_financials.csv", symbol))
    }

    pub fn analysis_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}_analysis.json", symbol))
    }

    pub fn chart_path(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{}_analysis.png", symbol))
    }

    /// Write every merged column of every period, one row per period.
    pub fn write_financials(
        &self,
        symbol: &str,
        periods: &[StatementPeriod],
    ) -> Result<PathBuf, AnalysisError> {
        let path = self.financials_path(symbol);
        let columns = column_union(periods);

        let mut writer = csv::Writer::from_path(&path)
            .map_err(|e| AnalysisError::IoError(format!("{}: {}", path.display(), e)))?;
        writer
            .write_record(&columns)
            .map_err(|e| AnalysisError::IoError(format!("{}: {}", path.display(), e)))?;
        for period in periods {
            let row: Vec<String> = columns
                .iter()
                .map(|c| cell(period.raw.get(c.as_str())))
                .collect();
            writer
                .write_record(&row)
                .map_err(|e| AnalysisError::IoError(format!("{}: {}", path.display(), e)))?;
        }
        writer.flush()?;

        tracing::info!("Saved {} periods for {} to {}", periods.len(), symbol, path.display());
        Ok(path)
    }

    pub fn write_analysis(
        &self,
        symbol: &str,
        valuation: &ValuationResult,
    ) -> Result<PathBuf, AnalysisError> {
        let path = self.analysis_path(symbol);
        let body = serde_json::to_string_pretty(valuation)
            .map_err(|e| AnalysisError::IoError(format!("serialize {}: {}", symbol, e)))?;
        fs::write(&path, body)
            .map_err(|e| AnalysisError::IoError(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Saved analysis for {} to {}", symbol, path.display());
        Ok(path)
    }
}

/// Column names across all periods, in first-seen order.
fn column_union(periods: &[StatementPeriod]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for period in periods {
        for key in period.raw.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn period(value: Value) -> StatementPeriod {
        match value {
            Value::Object(map) => StatementPeriod::from_record("ACME", map).unwrap(),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_paths() {
        let store = OutputStore::new("out");
        assert_eq!(store.financials_path("AAPL"), Path::new("out/AAPL_financials.csv"));
        assert_eq!(store.analysis_path("AAPL"), Path::new("out/AAPL_analysis.json"));
        assert_eq!(store.chart_path("AAPL"), Path::new("out/AAPL_analysis.png"));
    }

    #[test]
    fn test_write_financials_uses_column_union() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path());
        let periods = vec![
            period(json!({"date": "2024-12-31", "revenue": 1452.0, "marketCap": null})),
            period(json!({"date": "2023-12-31", "revenue": 1210, "reportedCurrency": "USD"})),
        ];

        let path = store.write_financials("ACME", &periods).unwrap();
        let mut reader = csv::Reader::from_path(&path).unwrap();

        let headers: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert!(headers.contains(&"reportedCurrency".to_string()));
        assert!(headers.contains(&"symbol".to_string()));
        assert_eq!(headers.len(), 5);

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        let currency_idx = headers.iter().position(|h| h == "reportedCurrency").unwrap();
        let cap_idx = headers.iter().position(|h| h == "marketCap").unwrap();
        assert_eq!(&rows[0][currency_idx], "");
        assert_eq!(&rows[0][cap_idx], "");
        assert_eq!(&rows[1][currency_idx], "USD");
    }

    #[test]
    fn test_ensure_dir_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = OutputStore::new(dir.path().join("a").join("b"));
        store.ensure_dir().unwrap();
        assert!(store.dir().is_dir());
    }
}
