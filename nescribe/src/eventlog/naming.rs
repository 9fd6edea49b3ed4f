//! Log file naming: `log-<host>-<yyyy_mm_dd>[-<n>].json`.

use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

const EXTENSION: &str = ".json";

/// File name stem shared by every log of `host` on `date`.
pub fn log_stem(host: &str, date: NaiveDate) -> String {
    format!("log-{}-{}", host, date.format("%Y_%m_%d"))
}

/// Sequence number of `file_name` if it is a log of `stem`.
///
/// The unsuffixed file is sequence 0.
fn sequence_of(file_name: &str, stem: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(stem)?.strip_suffix(EXTENSION)?;
    if rest.is_empty() {
        return Some(0);
    }
    let digits = rest.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn path_for(directory: &Path, stem: &str, sequence: u32) -> PathBuf {
    if sequence == 0 {
        directory.join(format!("{stem}{EXTENSION}"))
    } else {
        directory.join(format!("{stem}-{sequence}{EXTENSION}"))
    }
}

/// Highest sequence number among existing logs of `host` on `date`.
pub fn max_sequence(directory: &Path, host: &str, date: NaiveDate) -> io::Result<Option<u32>> {
    let stem = log_stem(host, date);
    let mut max = None;
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if let Some(seq) = entry.file_name().to_str().and_then(|n| sequence_of(n, &stem)) {
            max = max.max(Some(seq));
        }
    }
    Ok(max)
}

/// Path for a new log: one past the highest existing sequence, or the
/// unsuffixed name if no log exists yet.
pub fn next_log_path(directory: &Path, host: &str, date: NaiveDate) -> io::Result<PathBuf> {
    let stem = log_stem(host, date);
    let sequence = match max_sequence(directory, host, date)? {
        Some(max) => max + 1,
        None => 0,
    };
    Ok(path_for(directory, &stem, sequence))
}

/// Path of the newest existing log of `host` on `date`.
pub fn latest_log_path(directory: &Path, host: &str, date: NaiveDate) -> io::Result<Option<PathBuf>> {
    let stem = log_stem(host, date);
    Ok(max_sequence(directory, host, date)?.map(|seq| path_for(directory, &stem, seq)))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_sequence_of() {
        let stem = "log-H-2024_01_01";
        assert_eq!(sequence_of("log-H-2024_01_01.json", stem), Some(0));
        assert_eq!(sequence_of("log-H-2024_01_01-7.json", stem), Some(7));
        assert_eq!(sequence_of("log-H-2024_01_01-x.json", stem), None);
        assert_eq!(sequence_of("log-H-2024_01_01.txt", stem), None);
        assert_eq!(sequence_of("log-HX-2024_01_01.json", stem), None);
    }

    #[test]
    fn test_first_log_is_unsuffixed() {
        let dir = tempfile::tempdir().unwrap();
        let path = next_log_path(dir.path(), "H", date()).unwrap();
        assert_eq!(path, dir.path().join("log-H-2024_01_01.json"));
        assert_eq!(latest_log_path(dir.path(), "H", date()).unwrap(), None);
    }

    #[test]
    fn test_next_suffix_after_existing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("log-H-2024_01_01.json"), "").unwrap();
        fs::write(dir.path().join("log-H-2024_01_01-1.json"), "").unwrap();
        fs::write(dir.path().join("log-H-2024_01_02-9.json"), "").unwrap();
        fs::write(dir.path().join("log-G-2024_01_01-5.json"), "").unwrap();

        let path = next_log_path(dir.path(), "H", date()).unwrap();
        assert_eq!(path, dir.path().join("log-H-2024_01_01-2.json"));

        let latest = latest_log_path(dir.path(), "H", date()).unwrap();
        assert_eq!(latest, Some(dir.path().join("log-H-2024_01_01-1.json")));
    }
}
