//! Resume check for previously extracted files.
//!
//! This is a size and line-count heuristic, not content validation: a file of
//! at least [`MIN_COMPLETE_BYTES`] bytes with more than one line is treated as
//! complete.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Smallest size an extracted file must have to count as complete.
pub const MIN_COMPLETE_BYTES: u64 = 100;

/// Returns true if `path` must be (re)downloaded.
///
/// Any error reading the file counts as "needs download".
#[must_use]
pub fn is_download_needed(path: &Path, overwrite: bool) -> bool {
    if overwrite {
        return true;
    }
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() >= MIN_COMPLETE_BYTES => {
            !has_more_than_one_line(path)
        }
        _ => true,
    }
}

fn has_more_than_one_line(path: &Path) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut count = 0;
    for line in BufReader::new(file).lines().take(2) {
        if line.is_err() {
            return false;
        }
        count += 1;
    }
    count > 1
}
