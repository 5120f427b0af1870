//! Append-only proctoring event log.
//!
//! One human-readable line per event:
//! `2026-01-02 03:04:05,678 - proctor_shield - INFO - Detected 1 faces in the frame`.

use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::constants::EVENT_LOGGER_NAME;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warning,
    Error,
}

impl EventLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            EventLevel::Info => "INFO",
            EventLevel::Warning => "WARNING",
            EventLevel::Error => "ERROR",
        }
    }
}

#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("event log I/O failed on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("event log unavailable: {0}")]
    Unavailable(String),
}

/// Line sink with tail reads.
pub trait EventLog: Send + Sync {
    fn append(&self, level: EventLevel, message: &str) -> Result<(), EventLogError>;

    /// Up to `n` most recent lines, oldest first, without line terminators.
    fn tail(&self, n: usize) -> Result<Vec<String>, EventLogError>;

    /// Cheap writability check for readiness; does not read the log.
    fn check(&self) -> Result<(), EventLogError>;
}

pub fn format_line(at: DateTime<Utc>, level: EventLevel, message: &str) -> String {
    format!(
        "{} - {} - {} - {}",
        at.format("%Y-%m-%d %H:%M:%S,%3f"),
        EVENT_LOGGER_NAME,
        level.as_str(),
        message.replace(['\r', '\n'], " ")
    )
}

/// Keeps at most `n` items of a fallible stream, stopping at the first error.
fn keep_last<E>(
    lines: impl IntoIterator<Item = Result<String, E>>,
    n: usize,
) -> Result<Vec<String>, E> {
    let kept = lines
        .into_iter()
        .try_fold(VecDeque::with_capacity(n), |mut out, line| -> Result<_, E> {
            let line = line?;
            if n > 0 {
                if out.len() == n {
                    out.pop_front();
                }
                out.push_back(line);
            }
            Ok(out)
        })?;
    Ok(kept.into())
}

/// File-backed log: opened in append mode per write, re-scanned per tail.
#[derive(Debug)]
pub struct FileEventLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileEventLog {
    /// Creates the file if it does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EventLogError> {
        let log = Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        };
        log.open_for_append()?;
        Ok(log)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> EventLogError {
        EventLogError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn open_for_append(&self) -> Result<File, EventLogError> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))
    }
}

impl EventLog for FileEventLog {
    fn append(&self, level: EventLevel, message: &str) -> Result<(), EventLogError> {
        let line = format_line(Utc::now(), level, message);
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut file = self.open_for_append()?;
        writeln!(file, "{line}").map_err(|e| self.io_error(e))
    }

    fn tail(&self, n: usize) -> Result<Vec<String>, EventLogError> {
        let file = File::open(&self.path).map_err(|e| self.io_error(e))?;
        keep_last(BufReader::new(file).lines(), n).map_err(|e| self.io_error(e))
    }

    fn check(&self) -> Result<(), EventLogError> {
        self.open_for_append().map(drop)
    }
}

/// In-memory log for tests; can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct MemoryEventLog {
    lines: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn fail_if_set(&self) -> Result<(), EventLogError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(EventLogError::Unavailable("memory log set to fail".to_string()));
        }
        Ok(())
    }
}

impl EventLog for MemoryEventLog {
    fn append(&self, level: EventLevel, message: &str) -> Result<(), EventLogError> {
        self.fail_if_set()?;
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(format_line(Utc::now(), level, message));
        Ok(())
    }

    fn tail(&self, n: usize) -> Result<Vec<String>, EventLogError> {
        self.fail_if_set()?;
        keep_last(self.lines().into_iter().map(Ok), n)
    }

    fn check(&self) -> Result<(), EventLogError> {
        self.fail_if_set()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn line_format_matches_log_convention() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(678);
        assert_eq!(
            format_line(at, EventLevel::Warning, "Eye movement detected"),
            "2026-01-02 03:04:05,678 - proctor_shield - WARNING - Eye movement detected"
        );
    }

    #[test]
    fn newlines_in_messages_stay_on_one_line() {
        let line = format_line(Utc::now(), EventLevel::Error, "bad\nthing");
        assert!(!line.contains('\n'));
        assert!(line.ends_with("bad thing"));
    }

    #[test]
    fn file_log_appends_and_tails_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileEventLog::open(dir.path().join("events.log")).unwrap();
        for i in 0..15 {
            log.append(EventLevel::Info, &format!("event {i}")).unwrap();
        }
        let tail = log.tail(10).unwrap();
        assert_eq!(tail.len(), 10);
        assert!(tail[0].ends_with("event 5"));
        assert!(tail[9].ends_with("event 14"));
    }

    #[test]
    fn short_file_returns_every_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = FileEventLog::open(dir.path().join("events.log")).unwrap();
        log.append(EventLevel::Info, "first").unwrap();
        log.append(EventLevel::Info, "second").unwrap();
        let tail = log.tail(10).unwrap();
        assert_eq!(tail.len(), 2);
        assert!(tail[0].ends_with("first"));
        assert!(tail[1].ends_with("second"));
    }

    #[test]
    fn open_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.log");
        let log = FileEventLog::open(&path).unwrap();
        assert!(path.exists());
        assert!(log.tail(10).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_an_error_on_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.log");
        let log = FileEventLog::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(log.tail(10), Err(EventLogError::Io { .. })));
    }

    #[test]
    fn memory_log_can_fail() {
        let log = MemoryEventLog::new();
        log.append(EventLevel::Info, "ok").unwrap();
        log.set_failing(true);
        assert!(log.append(EventLevel::Info, "nope").is_err());
        assert!(log.tail(10).is_err());
        assert!(log.check().is_err());
        log.set_failing(false);
        assert_eq!(log.tail(10).unwrap().len(), 1);
    }

    #[test]
    fn keep_last_handles_zero() {
        let kept = keep_last(vec![Ok::<_, io::Error>("a".to_string())], 0).unwrap();
        assert!(kept.is_empty());
    }

    #[test]
    fn keep_last_stops_at_first_error() {
        let lines = vec![
            Ok("a".to_string()),
            Err("broken"),
            Ok("c".to_string()),
        ];
        assert_eq!(keep_last(lines, 2), Err("broken"));
    }

    #[test]
    fn tail_of_long_file_keeps_only_the_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.log");
        let body: String = (0..5000).map(|i| format!("line {i}\n")).collect();
        std::fs::write(&path, body).unwrap();

        let log = FileEventLog::open(&path).unwrap();
        assert_eq!(log.tail(3).unwrap(), vec!["line 4997", "line 4998", "line 4999"]);
    }

    #[test]
    fn invalid_utf8_line_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.log");
        std::fs::write(&path, b"ok\n\xff\xfe\n").unwrap();

        let log = FileEventLog::open(&path).unwrap();
        assert!(matches!(log.tail(10), Err(EventLogError::Io { .. })));
    }

    #[test]
    fn check_recreates_and_detects_unwritable_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let log = FileEventLog::open(&path).unwrap();

        std::fs::remove_file(&path).unwrap();
        log.check().unwrap();
        assert!(path.exists());

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
        assert!(matches!(log.check(), Err(EventLogError::Io { .. })));
    }
}
