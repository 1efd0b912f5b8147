use analysis_core::{CompanyProfile, StatementPeriod};
use serde_json::Value;
use std::collections::HashMap;

use crate::envelope::Record;

fn record_date(record: &Record) -> Option<&str> {
    record.get("date").and_then(|v| v.as_str())
}

fn index_by_date(records: Vec<Record>) -> HashMap<String, Record> {
    let mut by_date = HashMap::with_capacity(records.len());
    for record in records {
        if let Some(date) = record_date(&record).map(str::to_string) {
            by_date.entry(date).or_insert(record);
        }
    }
    by_date
}

/// Join income and balance entries on their reporting date.
///
/// The join is inner: an income entry without a balance entry for the same date (or the
/// reverse) is dropped. Balance fields override income fields of the same name.
/// Cash-flow fields only fill columns the other two statements don't carry. Market cap
/// and price from the profile are injected into every period. The result is sorted
/// newest first.
pub fn join_statements(
    symbol: &str,
    income: Vec<Record>,
    balance: Vec<Record>,
    cash_flow: Vec<Record>,
    profile: Option<&CompanyProfile>,
) -> Vec<StatementPeriod> {
    let balance_by_date = index_by_date(balance);
    let cash_by_date = index_by_date(cash_flow);

    let market_cap = profile
        .and_then(|p| p.market_cap)
        .map(Value::from)
        .unwrap_or(Value::Null);
    let price = profile
        .and_then(|p| p.price)
        .map(Value::from)
        .unwrap_or(Value::Null);

    let mut periods = Vec::new();
    for income_entry in income {
        let Some(date) = record_date(&income_entry).map(str::to_string) else {
            continue;
        };
        let Some(balance_entry) = balance_by_date.get(&date) else {
            tracing::debug!("{}: no balance sheet for {}, dropping period", symbol, date);
            continue;
        };

        let mut merged = income_entry;
        for (key, value) in balance_entry {
            merged.insert(key.clone(), value.clone());
        }
        if let Some(cash_entry) = cash_by_date.get(&date) {
            for (key, value) in cash_entry {
                merged.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        merged.insert("marketCap".to_string(), market_cap.clone());
        merged.insert("price".to_string(), price.clone());

        match StatementPeriod::from_record(symbol, merged) {
            Ok(period) => periods.push(period),
            Err(e) => tracing::warn!("{}: skipping period {}: {}", symbol, date, e),
        }
    }

    periods.sort_by(|a, b| b.date.cmp(&a.date));
    periods
}
