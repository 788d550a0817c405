//! Benchmark fixtures for quarry.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use quarry_lib::{ArchiveSource, SourceError, SourceResponse};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;

/// `count` synthetic symbols (`SYM0000USDT`, `SYM0001USDT`, ...).
pub fn sample_symbols(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("SYM{i:04}USDT")).collect()
}

/// A fixed calendar day.
pub fn sample_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// CSV body of roughly `rows` aggTrades-like rows.
pub fn sample_csv(rows: usize) -> String {
    let mut csv = String::from(
        "agg_trade_id,price,quantity,first_trade_id,last_trade_id,transact_time,is_buyer_maker\n",
    );
    for i in 0..rows {
        csv.push_str(&format!(
            "{i},42000.{},0.{:03},{i},{i},{},{}\n",
            i % 100,
            i % 1000,
            1_704_067_200_000_u64 + i as u64,
            i % 2 == 0
        ));
    }
    csv
}

/// Zip archive bytes holding one entry named `entry`.
pub fn fixture_archive(entry: &str, body: &str) -> std::io::Result<Vec<u8>> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.start_file(entry, SimpleFileOptions::default())?;
    writer.write_all(body.as_bytes())?;
    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

/// Writes [`fixture_archive`] to `path`.
pub fn write_fixture_archive(path: &Path, entry: &str, body: &str) -> std::io::Result<()> {
    std::fs::write(path, fixture_archive(entry, body)?)
}

/// Source that serves the same archive for every URL, split into chunks.
#[derive(Debug, Clone)]
pub struct MemorySource {
    body: Bytes,
    chunk_size: usize,
}

impl MemorySource {
    /// Serves `body` in chunks of `chunk_size` bytes.
    pub fn new(body: Vec<u8>, chunk_size: usize) -> Self {
        Self {
            body: Bytes::from(body),
            chunk_size: chunk_size.max(1),
        }
    }
}

#[async_trait]
impl ArchiveSource for MemorySource {
    async fn get(&self, _url: &str) -> Result<SourceResponse, SourceError> {
        let chunks: Vec<Result<Bytes, SourceError>> = self
            .body
            .chunks(self.chunk_size)
            .map(|chunk| Ok(self.body.slice_ref(chunk)))
            .collect();
        Ok(SourceResponse::Body(Box::pin(futures::stream::iter(chunks))))
    }
}
