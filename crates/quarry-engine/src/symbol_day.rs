//! Sequential fetch of every archive for one symbol and date.

use chrono::NaiveDate;
use quarry_fetch::Fetcher;
use quarry_types::{DataTypeSelection, DownloadEvent, Interval, SymbolDataResult};

use crate::plan::{symbol_day_tasks, usable_data_types};

/// Fetches every enabled data type (and interval) for one symbol and date, one
/// after another, and returns the per-key results.
pub async fn fetch_symbol_day(
    fetcher: &Fetcher,
    symbol: &str,
    date: NaiveDate,
    selection: &DataTypeSelection,
    intervals: &[Interval],
) -> SymbolDataResult {
    let data_types = usable_data_types(selection, intervals, fetcher.sink().as_ref());
    let mut result = SymbolDataResult::new(symbol.to_string(), date);

    for task in symbol_day_tasks(symbol, date, &data_types, intervals) {
        let outcome = fetcher.fetch(&task).await;
        result.record(&outcome);
    }

    fetcher.sink().emit(DownloadEvent::SymbolDayFinished {
        result: result.clone(),
    });
    result
}
