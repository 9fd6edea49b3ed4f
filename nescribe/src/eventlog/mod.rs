//! Durable, append-only JSON log of every command run against a host.
//!
//! A log file holds one JSON array. The opening `[` is written when the
//! file is created, each entry is written and flushed as soon as it is
//! recorded, and the closing `]` is written by [`EventLog::close`] (or on
//! drop). A file cut short by a crash is therefore missing only its
//! terminator.

mod entry;
pub mod naming;

pub use entry::{EntryKind, LogEntry, RunContext};

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::{LogError, Unrecorded};
use crate::parser::{Aggregation, Domain, ParseInput, ParsedTable, Parser};

const ARRAY_OPEN: &str = "[\n";
const SEPARATOR: &str = ",\n";
const ARRAY_CLOSE: &str = "\n]\n";

/// A log store handed to several sessions.
///
/// The mutex is held only while one entry is written and flushed.
pub type SharedEventLog = Arc<Mutex<EventLog>>;

/// How [`EventLog::open`] picks its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Start a new file with the next free sequence number.
    #[default]
    Create,
    /// Continue the newest existing file for the host and date, or create
    /// one if there is none.
    Append,
}

/// Where logs are written and where templates are read from.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Directory receiving the log files.
    pub directory: PathBuf,

    /// Base directory of the template tree.
    pub templates: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            templates: PathBuf::from("cmd_templates"),
        }
    }
}

impl LogConfig {
    pub fn new(directory: impl Into<PathBuf>, templates: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            templates: templates.into(),
        }
    }
}

/// Event log for one host.
#[derive(Debug)]
pub struct EventLog {
    host: String,
    path: PathBuf,
    file: Option<File>,
    records: usize,
    timezone_ne: String,
    run: RunContext,
    parser: Parser,
}

impl EventLog {
    /// Open a log for `host` dated today.
    pub fn open(host: &str, mode: OpenMode, config: &LogConfig, run: RunContext) -> Result<Self, LogError> {
        let parser = Parser::builtin(&config.templates);
        let date = Local::now().date_naive();
        let directory = config.directory.as_path();

        let io_err = |source| LogError::Io {
            path: directory.to_path_buf(),
            source,
        };

        let (path, file, records) = match mode {
            OpenMode::Append => match naming::latest_log_path(directory, host, date).map_err(io_err)? {
                Some(path) => {
                    let (file, records) = reopen(&path).map_err(|source| LogError::Io {
                        path: path.clone(),
                        source,
                    })?;
                    (path, file, records)
                }
                None => create(naming::next_log_path(directory, host, date).map_err(io_err)?)?,
            },
            OpenMode::Create => create(naming::next_log_path(directory, host, date).map_err(io_err)?)?,
        };

        debug!("event log for {} at {} ({} existing records)", host, path.display(), records);

        Ok(Self {
            host: host.to_string(),
            path,
            file: Some(file),
            records,
            timezone_ne: "Not Set".to_string(),
            run,
            parser,
        })
    }

    /// Replace the parser used to fill `results`.
    pub fn with_parser(mut self, parser: Parser) -> Self {
        self.parser = parser;
        self
    }

    /// Wrap this log for sharing between sessions.
    pub fn shared(self) -> SharedEventLog {
        Arc::new(Mutex::new(self))
    }

    /// Build an entry, parse its output and append it to the file.
    ///
    /// The entry is returned even when it cannot be written.
    pub fn record_event(
        &mut self,
        stdin: &str,
        stdout: &str,
        stderr: &str,
        duration: Duration,
        domain: Domain,
        secondary_host: Option<&str>,
    ) -> Result<LogEntry, Unrecorded> {
        let aggregation = self.parser.aggregate(stdin, stdout, domain);
        self.record_aggregation(stdin, stdout, stderr, duration, domain, aggregation, secondary_host)
    }

    /// Record an event whose output was already parsed, keyed by template
    /// name.
    pub fn record_parsed(
        &mut self,
        stdin: &str,
        stdout: &str,
        tables: IndexMap<String, ParsedTable>,
        duration: Duration,
        domain: Domain,
        secondary_host: Option<&str>,
    ) -> Result<LogEntry, Unrecorded> {
        let aggregation = self.parser.aggregate(stdin, ParseInput::Parsed(tables), domain);
        self.record_aggregation(stdin, stdout, "", duration, domain, aggregation, secondary_host)
    }

    /// Templates that could not be reshaped are reported in `stderr`.
    #[allow(clippy::too_many_arguments)]
    fn record_aggregation(
        &mut self,
        stdin: &str,
        stdout: &str,
        stderr: &str,
        duration: Duration,
        domain: Domain,
        aggregation: Aggregation,
        secondary_host: Option<&str>,
    ) -> Result<LogEntry, Unrecorded> {
        let mut stderr = stderr.to_string();
        for failure in &aggregation.errors {
            if !stderr.is_empty() {
                stderr.push('\n');
            }
            stderr.push_str(&failure.to_string());
        }

        let entry = self.build_entry(
            EntryKind::Command,
            stdin,
            stdout,
            &stderr,
            duration,
            domain,
            aggregation.results,
            secondary_host,
        );
        self.write(entry)
    }

    /// Insert a free-form comment.
    pub fn comment(&mut self, text: &str, secondary_host: Option<&str>) -> Result<LogEntry, Unrecorded> {
        let entry = self.build_entry(
            EntryKind::Comment,
            &format!("Comment: {}", text),
            "",
            "",
            Duration::ZERO,
            Domain::Na,
            Default::default(),
            secondary_host,
        );
        self.write(entry)
    }

    /// Write the closing marker and release the file. Idempotent.
    pub fn close(&mut self) -> Result<(), LogError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.write_all(ARRAY_CLOSE.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| LogError::Io {
                path: self.path.clone(),
                source,
            })?;
        debug!("closed event log {} with {} records", self.path.display(), self.records);
        Ok(())
    }

    /// Set the remote element's timezone label for subsequent entries.
    pub fn set_ne_timezone(&mut self, label: impl Into<String>) {
        self.timezone_ne = label.into();
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Entries in the file, including those present before an append.
    pub fn records_written(&self) -> usize {
        self.records
    }

    pub fn run(&self) -> &RunContext {
        &self.run
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    #[allow(clippy::too_many_arguments)]
    fn build_entry(
        &self,
        kind: EntryKind,
        stdin: &str,
        stdout: &str,
        stderr: &str,
        duration: Duration,
        domain: Domain,
        results: crate::parser::Results,
        secondary_host: Option<&str>,
    ) -> LogEntry {
        LogEntry {
            timestamp: self.run.now(),
            host: self.host.clone(),
            domain,
            kind,
            stdin: stdin.to_string(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            results,
            duration: entry::seconds(duration),
            elapsed: entry::seconds(self.run.elapsed()),
            timezone_host: self.run.host_timezone().to_string(),
            timezone_ne: self.timezone_ne.clone(),
            secondary_host: secondary_host.map(str::to_string),
        }
    }

    fn write(&mut self, entry: LogEntry) -> Result<LogEntry, Unrecorded> {
        let Some(file) = self.file.as_mut() else {
            return Err(Unrecorded {
                entry: Box::new(entry),
                source: LogError::FileNotOpen {
                    host: self.host.clone(),
                },
            });
        };

        let separator = if self.records > 0 { SEPARATOR } else { "" };
        let result = serde_json::to_string_pretty(&entry)
            .map_err(io::Error::from)
            .and_then(|json| file.write_all(format!("{separator}{json}").as_bytes()))
            .and_then(|_| file.flush());

        match result {
            Ok(()) => {
                self.records += 1;
                Ok(entry)
            }
            Err(source) => Err(Unrecorded {
                entry: Box::new(entry),
                source: LogError::Io {
                    path: self.path.clone(),
                    source,
                },
            }),
        }
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to finalize event log: {}", e);
        }
    }
}

/// Create `path` and write the array opening marker.
fn create(path: PathBuf) -> Result<(PathBuf, File, usize), LogError> {
    let result = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .and_then(|mut file| {
            file.write_all(ARRAY_OPEN.as_bytes())?;
            file.flush()?;
            Ok(file)
        });

    match result {
        Ok(file) => Ok((path, file, 0)),
        Err(source) => Err(LogError::Io { path, source }),
    }
}

/// Reopen an existing log, dropping its closing marker so entries can be
/// appended to the array. A torn final entry left by a crash is cut off.
/// Returns the file and its record count.
fn reopen(path: &Path) -> io::Result<(File, usize)> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;

    let body = content.trim_end();
    let body = body.strip_suffix(']').unwrap_or(body).trim_end();

    match complete_prefix(body) {
        Some((keep, records)) if records > 0 => {
            if keep < body.len() {
                warn!("{}: dropping {} bytes of a torn entry", path.display(), body.len() - keep);
            }
            file.set_len(keep as u64)?;
            file.seek(SeekFrom::End(0))?;
            Ok((file, records))
        }
        _ => {
            file.set_len(0)?;
            file.seek(SeekFrom::Start(0))?;
            file.write_all(ARRAY_OPEN.as_bytes())?;
            file.flush()?;
            Ok((file, 0))
        }
    }
}

/// Length of the longest prefix of `body` holding only complete entries,
/// with the number of entries in it.
///
/// `body` is an array missing its terminator.
fn complete_prefix(body: &str) -> Option<(usize, usize)> {
    let count = |prefix: &str| {
        serde_json::from_str::<Vec<serde_json::Value>>(&format!("{prefix}{ARRAY_CLOSE}"))
            .ok()
            .map(|entries| entries.len())
    };

    if let Some(records) = count(body) {
        return Some((body.len(), records));
    }
    body.rmatch_indices('}')
        .find_map(|(pos, _)| count(&body[..=pos]).map(|records| (pos + 1, records)))
}
