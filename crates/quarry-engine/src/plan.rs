//! Task generation.

use chrono::NaiveDate;
use quarry_types::{
    ConfigError, DataType, DataTypeSelection, DateRange, DownloadEvent, EventSink, Interval,
    Settings, Task,
};

/// Resolves the configured `[time_range]` against `today`.
///
/// # Errors
///
/// Returns [`ConfigError::DateRange`] for a malformed or empty range.
pub fn resolve_range(settings: &Settings, today: NaiveDate) -> Result<DateRange, ConfigError> {
    let range = &settings.time_range;
    Ok(DateRange::parse(&range.start_date, &range.end_date, today)?)
}

/// Expands `range × symbols × enabled data types [× intervals]` into tasks.
///
/// Order is date-major, then symbol, then data type in selection order, then
/// interval in list order. Interval-bearing types with no intervals are
/// skipped with one [`DownloadEvent::IntervalsMissing`] each. Duplicate
/// symbols and intervals are dropped so that no two tasks share an output.
///
/// # Errors
///
/// Returns [`ConfigError::NoSymbols`] if `symbols` is empty.
pub fn generate_tasks(
    range: &DateRange,
    symbols: &[String],
    selection: &DataTypeSelection,
    intervals: &[Interval],
    sink: &dyn EventSink,
) -> Result<Vec<Task>, ConfigError> {
    let symbols = dedup(symbols.iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()));
    if symbols.is_empty() {
        return Err(ConfigError::NoSymbols);
    }
    let intervals = dedup(intervals.iter().copied());
    let data_types = usable_data_types(selection, &intervals, sink);

    let per_symbol_day = selection.files_per_symbol_day(&intervals);
    let mut tasks = Vec::with_capacity(range.total_days() * symbols.len() * per_symbol_day);
    for date in range.days() {
        for symbol in &symbols {
            tasks.extend(symbol_day_tasks(symbol, date, &data_types, &intervals));
        }
    }

    sink.emit(DownloadEvent::PlanBuilt {
        tasks: tasks.len(),
        days: range.total_days(),
        symbols: symbols.len(),
    });
    Ok(tasks)
}

/// Enabled data types that can produce tasks, warning about interval-bearing
/// types that have no intervals.
pub(crate) fn usable_data_types(
    selection: &DataTypeSelection,
    intervals: &[Interval],
    sink: &dyn EventSink,
) -> Vec<DataType> {
    selection
        .enabled()
        .filter(|data_type| {
            let usable = !data_type.requires_interval() || !intervals.is_empty();
            if !usable {
                sink.emit(DownloadEvent::IntervalsMissing {
                    data_type: *data_type,
                });
            }
            usable
        })
        .collect()
}

/// Tasks for one symbol and date, in data type then interval order.
pub(crate) fn symbol_day_tasks<'a>(
    symbol: &'a str,
    date: NaiveDate,
    data_types: &'a [DataType],
    intervals: &'a [Interval],
) -> impl Iterator<Item = Task> + 'a {
    data_types.iter().flat_map(move |&data_type| {
        let tasks: Vec<Task> = if data_type.requires_interval() {
            intervals
                .iter()
                .map(|&interval| Task::with_interval(symbol, date, data_type, interval))
                .collect()
        } else {
            vec![Task::new(symbol, date, data_type)]
        };
        tasks
    })
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut unique = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}
