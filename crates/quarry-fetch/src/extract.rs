//! Zip extraction for downloaded archives.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::ZipArchive;

/// Errors that can occur during extraction.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The archive is not a valid zip file.
    #[error("Invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Reading the archive or writing an entry failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive holds no files.
    #[error("Archive is empty")]
    Empty,

    /// The expected file was not produced and could not be inferred.
    #[error("Archive does not contain '{expected}'")]
    MissingEntry {
        /// The expected file name.
        expected: String,
    },

    /// The blocking extraction task did not complete.
    #[error("Extraction task failed: {0}")]
    Join(String),
}

/// Extracts every file of `archive` into `dir` and returns the path of the
/// extracted `expected` file.
///
/// Entries with unsafe names (absolute, or escaping `dir`) are ignored. If the
/// archive holds a single file under a different name, it is renamed to
/// `expected`. A partially written entry is removed before returning an error.
///
/// # Errors
///
/// Returns an error if the archive is corrupt or empty, if writing fails, or
/// if `expected` is not among the extracted files.
pub fn extract_archive(archive: &Path, dir: &Path, expected: &Path) -> Result<PathBuf, ExtractError> {
    let mut zip = ZipArchive::new(File::open(archive)?)?;
    let mut extracted = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        let Some(name) = entry.enclosed_name() else {
            continue;
        };
        let out_path = dir.join(name);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let written = File::create(&out_path).and_then(|file| {
            let mut writer = BufWriter::new(file);
            std::io::copy(&mut entry, &mut writer)?;
            writer.into_inner().map_err(|e| e.into_error())?.sync_all()
        });
        if let Err(e) = written {
            let _ = std::fs::remove_file(&out_path);
            return Err(e.into());
        }
        extracted.push(out_path);
    }

    match extracted.as_slice() {
        [] => Err(ExtractError::Empty),
        files if files.iter().any(|path| path == expected) => Ok(expected.to_path_buf()),
        [single] => {
            std::fs::rename(single, expected)?;
            Ok(expected.to_path_buf())
        }
        _ => Err(ExtractError::MissingEntry {
            expected: expected
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }),
    }
}

/// Runs [`extract_archive`] on the blocking thread pool.
///
/// # Errors
///
/// Returns the extraction error, or [`ExtractError::Join`] if the blocking
/// task panicked.
pub async fn extract_archive_blocking(
    archive: PathBuf,
    dir: PathBuf,
    expected: PathBuf,
) -> Result<PathBuf, ExtractError> {
    tokio::task::spawn_blocking(move || extract_archive(&archive, &dir, &expected))
        .await
        .map_err(|e| ExtractError::Join(e.to_string()))?
}
