use analysis_core::{AnalysisError, CompanyDirectory};

pub const DEFAULT_TOP: usize = 5;

/// Which symbols a batch run covers.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolSelection {
    /// Symbols named by the caller. The directory is not consulted.
    Explicit(Vec<String>),
    /// Every symbol the directory returns.
    All,
    /// The first N directory symbols, in directory order.
    Top(usize),
}

impl Default for SymbolSelection {
    fn default() -> Self {
        SymbolSelection::Top(DEFAULT_TOP)
    }
}

impl SymbolSelection {
    /// Explicit symbols win over `all`, which wins over `top`.
    pub fn from_flags(symbols: Vec<String>, all: bool, top: usize) -> Self {
        if !symbols.is_empty() {
            SymbolSelection::Explicit(symbols)
        } else if all {
            SymbolSelection::All
        } else {
            SymbolSelection::Top(top)
        }
    }

    pub fn needs_directory(&self) -> bool {
        !matches!(self, SymbolSelection::Explicit(_))
    }
}

/// Resolve a selection into an ordered symbol list.
pub async fn resolve_symbols<D>(
    selection: &SymbolSelection,
    directory: &D,
) -> Result<Vec<String>, AnalysisError>
where
    D: CompanyDirectory + ?Sized,
{
    match selection {
        SymbolSelection::Explicit(symbols) => Ok(symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect()),
        SymbolSelection::All => {
            let companies = directory.fetch_companies().await?;
            Ok(companies.into_iter().map(|c| c.symbol).collect())
        }
        SymbolSelection::Top(n) => {
            let companies = directory.fetch_companies().await?;
            Ok(companies.into_iter().take(*n).map(|c| c.symbol).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::CompanyRecord;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticDirectory {
        symbols: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl StaticDirectory {
        fn new(symbols: Vec<&'static str>) -> Self {
            Self {
                symbols,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CompanyDirectory for StaticDirectory {
        async fn fetch_companies(&self) -> Result<Vec<CompanyRecord>, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .symbols
                .iter()
                .map(|s| CompanyRecord {
                    symbol: s.to_string(),
                    name: None,
                    sector: None,
                    industry: None,
                    market_cap: None,
                    country: None,
                    extra: Default::default(),
                })
                .collect())
        }
    }

    #[test]
    fn test_from_flags_priority() {
        assert_eq!(
            SymbolSelection::from_flags(vec!["aapl".into()], true, 3),
            SymbolSelection::Explicit(vec!["aapl".into()])
        );
        assert_eq!(SymbolSelection::from_flags(vec![], true, 3), SymbolSelection::All);
        assert_eq!(SymbolSelection::from_flags(vec![], false, 3), SymbolSelection::Top(3));
        assert_eq!(SymbolSelection::default(), SymbolSelection::Top(5));
    }

    #[tokio::test]
    async fn test_explicit_symbols_skip_directory() {
        let directory = StaticDirectory::new(vec!["MSFT"]);
        let selection = SymbolSelection::Explicit(vec!["aapl".into(), " tsla ".into(), "".into()]);

        let symbols = resolve_symbols(&selection, &directory).await.unwrap();
        assert_eq!(symbols, vec!["AAPL", "TSLA"]);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_top_and_all() {
        let directory = StaticDirectory::new(vec!["A", "B", "C", "D", "E", "F", "G"]);

        let top = resolve_symbols(&SymbolSelection::default(), &directory).await.unwrap();
        assert_eq!(top, vec!["A", "B", "C", "D", "E"]);

        let all = resolve_symbols(&SymbolSelection::All, &directory).await.unwrap();
        assert_eq!(all.len(), 7);
        assert_eq!(directory.calls.load(Ordering::SeqCst), 2);
    }
}
