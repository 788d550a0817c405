//! Bounded-concurrency dispatch of download tasks.

use futures::future;
use futures::stream::{self, StreamExt};
use quarry_fetch::Fetcher;
use quarry_types::{
    DownloadEvent, DownloadOutcome, QuarryError, Result, RunSummary, Task, TaskError,
};

use crate::aggregate::{Aggregator, DEFAULT_PROGRESS_EVERY};
use crate::shutdown::SharedShutdown;

/// Default worker pool size.
pub const DEFAULT_WORKERS: usize = 3;

/// Runs tasks through a [`Fetcher`] with at most `workers` in flight.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    fetcher: Fetcher,
    workers: usize,
    progress_every: usize,
    shutdown: Option<SharedShutdown>,
}

impl Dispatcher {
    /// Creates a dispatcher. A worker count of zero is treated as one.
    #[must_use]
    pub fn new(fetcher: Fetcher, workers: usize) -> Self {
        Self {
            fetcher,
            workers: workers.max(1),
            progress_every: DEFAULT_PROGRESS_EVERY,
            shutdown: None,
        }
    }

    /// Sets how many completions pass between progress events.
    #[must_use]
    pub fn with_progress_every(mut self, progress_every: usize) -> Self {
        self.progress_every = progress_every.max(1);
        self
    }

    /// Attaches a shutdown coordinator; once requested, no new task starts.
    #[must_use]
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Returns the worker pool size.
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every task to completion and returns the aggregate summary.
    ///
    /// Outcomes are aggregated in completion order by this call alone. A
    /// panicking worker fails only its own task.
    ///
    /// # Errors
    ///
    /// Returns [`QuarryError::NoTasks`] if `tasks` is empty.
    pub async fn run(&self, tasks: Vec<Task>) -> Result<RunSummary> {
        if tasks.is_empty() {
            return Err(QuarryError::NoTasks);
        }

        let sink = self.fetcher.sink().clone();
        let total = tasks.len();
        sink.emit(DownloadEvent::RunStarted {
            tasks: total,
            workers: self.workers,
        });

        let mut aggregator = Aggregator::new(&tasks, self.progress_every, sink.clone());
        let shutdown = self.shutdown.clone();

        let mut outcomes = stream::iter(tasks)
            .take_while(move |_| {
                let stop = shutdown
                    .as_ref()
                    .is_some_and(|shutdown| shutdown.is_shutdown_requested());
                future::ready(!stop)
            })
            .map(|task| self.spawn_task(task))
            .buffer_unordered(self.workers);

        while let Some(outcome) = outcomes.next().await {
            aggregator.record(&outcome);
        }

        let interrupted = aggregator.completed() < total;
        if interrupted {
            sink.emit(DownloadEvent::Interrupted {
                completed: aggregator.completed(),
                total,
            });
        }

        let summary = aggregator.finish(interrupted);
        sink.emit(DownloadEvent::Summary {
            summary: summary.clone(),
        });
        Ok(summary)
    }

    /// Runs one task on its own tokio task so a panic stays contained.
    async fn spawn_task(&self, task: Task) -> DownloadOutcome {
        let fetcher = self.fetcher.clone();
        let handle = {
            let task = task.clone();
            tokio::spawn(async move { fetcher.fetch(&task).await })
        };

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                let error = TaskError::Unexpected(format!("worker failed: {e}"));
                self.fetcher.sink().emit(DownloadEvent::TaskFailed {
                    task: task.clone(),
                    error: error.clone(),
                });
                DownloadOutcome::failed(task, error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShutdownCoordinator;
    use crate::plan::generate_tasks;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::NaiveDate;
    use quarry_fetch::{ArchiveSource, FetchConfig, SourceError, SourceResponse};
    use quarry_types::{
        DataType, DataTypeSelection, DateRange, EventSink, Interval, RecordingSink,
    };
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Clone)]
    enum Reply {
        NotFound,
        Status(u16),
        Archive,
        Panic,
    }

    /// Answers by URL substring; anything unmatched gets a valid archive.
    /// Tracks how many requests are open at once.
    struct RoutedSource {
        routes: HashMap<&'static str, Reply>,
        latency: Duration,
        requests: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl RoutedSource {
        fn new(routes: &[(&'static str, Reply)]) -> Arc<Self> {
            Self::with_latency(routes, Duration::from_millis(1))
        }

        fn with_latency(routes: &[(&'static str, Reply)], latency: Duration) -> Arc<Self> {
            Arc::new(Self {
                routes: routes.iter().cloned().collect(),
                latency,
                requests: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ArchiveSource for RoutedSource {
        async fn get(&self, url: &str) -> std::result::Result<SourceResponse, SourceError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let open = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(open, Ordering::SeqCst);
            tokio::time::sleep(self.latency).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let reply = self
                .routes
                .iter()
                .find(|(pattern, _)| url.contains(*pattern))
                .map_or(Reply::Archive, |(_, reply)| reply.clone());
            match reply {
                Reply::NotFound => Ok(SourceResponse::NotFound),
                Reply::Status(status) => Ok(SourceResponse::Status(status)),
                Reply::Panic => panic!("source exploded"),
                Reply::Archive => {
                    let name = url.rsplit('/').next().unwrap_or("x.zip").replace(".zip", ".csv");
                    let body = Bytes::from(archive(&name));
                    Ok(SourceResponse::Body(Box::pin(futures::stream::iter(vec![Ok(body)]))))
                }
            }
        }
    }

    fn archive(name: &str) -> Vec<u8> {
        let mut csv = String::from("id,price,qty,first_id,last_id,time,is_buyer_maker\n");
        for i in 0..4 {
            csv.push_str(&format!("{i},64000.5,0.25,{i},{i},1722470400000,false\n"));
        }
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(csv.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn config(output_dir: &Path) -> FetchConfig {
        FetchConfig {
            base_url: "http://store.test/".to_string(),
            output_dir: output_dir.to_path_buf(),
            retry_attempts: 2,
            retry_delay: Duration::ZERO,
            rate_limit_delay: Duration::ZERO,
            chunk_size: 8192,
            auto_extract: true,
            delete_archive: true,
            overwrite: false,
        }
    }

    fn plan() -> Vec<Task> {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 8, 2).unwrap(),
        )
        .unwrap();
        let selection = DataTypeSelection::new()
            .with(DataType::AggTrades, true)
            .with(DataType::Klines, true);
        let symbols = vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()];
        generate_tasks(
            &range,
            &symbols,
            &selection,
            &[Interval::Minute1, Interval::Hour1],
            &RecordingSink::new(),
        )
        .unwrap()
    }

    fn dispatcher(
        source: Arc<RoutedSource>,
        output_dir: &Path,
        workers: usize,
        sink: Arc<dyn EventSink>,
    ) -> Dispatcher {
        Dispatcher::new(Fetcher::new(source, config(output_dir), sink), workers)
    }

    #[tokio::test]
    async fn test_empty_plan_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let source = RoutedSource::new(&[]);
        let dispatcher = dispatcher(source, dir.path(), 2, Arc::new(RecordingSink::new()));

        assert!(matches!(dispatcher.run(Vec::new()).await, Err(QuarryError::NoTasks)));
    }

    #[tokio::test]
    async fn test_in_flight_never_exceeds_worker_bound() {
        for workers in [1, 2, 5] {
            let dir = tempfile::tempdir().unwrap();
            let source = RoutedSource::with_latency(&[], Duration::from_millis(20));
            let summary = dispatcher(
                source.clone(),
                dir.path(),
                workers,
                Arc::new(RecordingSink::new()),
            )
            .run(plan())
            .await
            .unwrap();

            let max = source.max_in_flight.load(Ordering::SeqCst);
            assert_eq!(summary.successful, 12);
            assert!(max <= workers, "{max} requests open with {workers} workers");
            if workers > 1 {
                assert!(max > 1, "no overlap with {workers} workers");
            }
            assert_eq!(source.in_flight.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_results_independent_of_worker_count() {
        let routes = [
            ("ETHUSDT-1m-2024-08-02", Reply::NotFound),
            ("BTCUSDT-aggTrades-2024-08-01", Reply::Status(500)),
        ];
        let mut summaries = Vec::new();

        for workers in [1, 2, 5] {
            let dir = tempfile::tempdir().unwrap();
            let source = RoutedSource::new(&routes);
            let sink = Arc::new(RecordingSink::new());
            let summary = dispatcher(source.clone(), dir.path(), workers, sink.clone())
                .run(plan())
                .await
                .unwrap();

            assert_eq!(summary.total, 12);
            assert_eq!(summary.completed, 12);
            assert_eq!(
                sink.count(|e| matches!(
                    e,
                    DownloadEvent::TaskSucceeded { .. } | DownloadEvent::TaskFailed { .. }
                )),
                12
            );
            // 10 successes, one 404 and one 500 retried twice
            assert_eq!(source.requests.load(Ordering::SeqCst), 13);
            summaries.push(summary);
        }

        for summary in &summaries {
            assert_eq!(summary.successful, 10);
            assert_eq!(summary.failed, 2);
            assert_eq!(summary.symbol_days_total, 4);
            assert_eq!(summary.symbol_days_successful(), 2);
            assert!(!summary.interrupted);
        }
        assert_eq!(summaries[0].symbol_days, summaries[2].symbol_days);
    }

    #[tokio::test]
    async fn test_single_agg_trades_task() {
        let dir = tempfile::tempdir().unwrap();
        let source = RoutedSource::new(&[]);
        let task = Task::new(
            "BTCUSDT",
            NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
            DataType::AggTrades,
        );

        let summary = dispatcher(source, dir.path(), 3, Arc::new(RecordingSink::new()))
            .run(vec![task])
            .await
            .unwrap();

        assert_eq!(summary.successful, 1);
        assert!(
            dir.path()
                .join("aggTrades/BTCUSDT/BTCUSDT-aggTrades-2024-08-01.csv")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_rerun_skips_completed_files() {
        let dir = tempfile::tempdir().unwrap();

        let first = dispatcher(RoutedSource::new(&[]), dir.path(), 3, Arc::new(RecordingSink::new()))
            .run(plan())
            .await
            .unwrap();
        let source = RoutedSource::new(&[]);
        let second = dispatcher(source.clone(), dir.path(), 3, Arc::new(RecordingSink::new()))
            .run(plan())
            .await
            .unwrap();

        assert_eq!(first.skipped, 0);
        assert_eq!(second.skipped, 12);
        assert_eq!(second.successful, 12);
        assert_eq!(source.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_worker_fails_only_its_task() {
        let dir = tempfile::tempdir().unwrap();
        let source = RoutedSource::new(&[("BTCUSDT-1h-2024-08-01", Reply::Panic)]);
        let sink = Arc::new(RecordingSink::new());

        let summary = dispatcher(source, dir.path(), 2, sink.clone())
            .run(plan())
            .await
            .unwrap();

        assert_eq!(summary.completed, 12);
        assert_eq!(summary.failed, 1);
        let unexpected = sink.count(|e| {
            matches!(
                e,
                DownloadEvent::TaskFailed {
                    error: TaskError::Unexpected(_),
                    ..
                }
            )
        });
        assert_eq!(unexpected, 1);
    }

    /// Requests shutdown as soon as the first task succeeds.
    struct StopAfterFirst {
        shutdown: SharedShutdown,
        inner: RecordingSink,
    }

    impl EventSink for StopAfterFirst {
        fn emit(&self, event: DownloadEvent) {
            if matches!(event, DownloadEvent::TaskSucceeded { .. }) {
                self.shutdown.request_shutdown();
            }
            self.inner.emit(event);
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_new_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let shutdown = ShutdownCoordinator::shared();
        let sink = Arc::new(StopAfterFirst {
            shutdown: shutdown.clone(),
            inner: RecordingSink::new(),
        });

        let summary = dispatcher(RoutedSource::new(&[]), dir.path(), 1, sink.clone())
            .with_shutdown(shutdown)
            .run(plan())
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.completed, 1);
        assert_eq!(summary.total, 12);
        assert_eq!(
            sink.inner
                .count(|e| matches!(e, DownloadEvent::Interrupted { completed: 1, total: 12 })),
            1
        );
    }
}
