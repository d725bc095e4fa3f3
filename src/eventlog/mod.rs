//! The append-only log of tracking events.
//!
//! Every served pixel leaves one line in a file. The file is only ever
//! appended to. Reading returns the most recent events in the order they
//! were appended, skipping over any line that cannot be parsed.

use std::{error, fmt, fs, io};
use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use log::trace;
use serde::{de, Deserialize, Deserializer};
use crate::api::event::TrackingEvent;

pub mod line;


//------------ EventLog ------------------------------------------------------

/// The event log file.
///
/// Appends within a process are serialized through a mutex. Each append
/// also holds an exclusive advisory lock on the file for the duration of a
/// single write of one complete line, so that cooperating processes do not
/// interleave their lines. Reading takes no lock.
#[derive(Debug)]
pub struct EventLog {
    /// The path to the log file.
    path: PathBuf,

    /// The format used for new lines.
    format: EventFormat,

    /// Serializes appends in this process.
    append_lock: Mutex<()>,
}

impl EventLog {
    /// Creates a log for the given file.
    ///
    /// The file itself is only created by the first append.
    pub fn new(path: impl Into<PathBuf>, format: EventFormat) -> Self {
        EventLog {
            path: path.into(),
            format,
            append_lock: Mutex::new(()),
        }
    }

    /// Creates a log and makes sure its parent directory exists.
    pub fn create(
        path: impl Into<PathBuf>, format: EventFormat
    ) -> Result<Self, EventLogError> {
        let res = Self::new(path, format);
        if let Some(parent) = res.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|err| {
                    EventLogError::io(
                        format!(
                            "cannot create directory '{}'", parent.display()
                        ),
                        err
                    )
                })?;
            }
        }
        Ok(res)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> EventFormat {
        self.format
    }

    /// Appends one event as a single line.
    pub fn append(&self, event: &TrackingEvent) -> Result<(), EventLogError> {
        let mut line = line::encode(event, self.format).map_err(|err| {
            EventLogError::Serialize(err.to_string())
        })?;
        line.push('\n');

        let _guard = self.append_lock.lock().map_err(|_| {
            EventLogError::other("event log append lock poisoned")
        })?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                EventLogError::io(
                    format!(
                        "cannot open event log '{}'", self.path.display()
                    ),
                    err
                )
            })?;

        let mut lock = fd_lock::RwLock::new(file);
        let mut file = lock.write().map_err(|err| {
            EventLogError::io(
                format!("cannot lock event log '{}'", self.path.display()),
                err
            )
        })?;

        file.write_all(line.as_bytes()).map_err(|err| {
            EventLogError::io(
                format!(
                    "cannot write to event log '{}'", self.path.display()
                ),
                err
            )
        })
    }

    /// Appends one event on the blocking thread pool.
    ///
    /// The async runtime keeps running while the append waits for the file
    /// lock.
    pub async fn spawn_append(
        self: Arc<Self>, event: TrackingEvent
    ) -> Result<(), EventLogError> {
        tokio::task::spawn_blocking(move || self.append(&event))
            .await
            .map_err(|err| {
                EventLogError::other(format!("event log append failed: {err}"))
            })?
    }

    /// Returns up to `limit` of the most recently appended events.
    ///
    /// The events are returned in the order they were appended. Lines that
    /// cannot be parsed are skipped. A missing file is treated as an empty
    /// log.
    pub fn read_recent(
        &self, limit: usize
    ) -> Result<Vec<TrackingEvent>, EventLogError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Vec::new())
            }
            Err(err) => {
                return Err(EventLogError::io(
                    format!(
                        "cannot read event log '{}'", self.path.display()
                    ),
                    err
                ))
            }
        };

        let mut events: Vec<_> = String::from_utf8_lossy(&content)
            .lines()
            .filter(|line| !line.is_empty())
            .filter_map(|text| {
                let res = line::parse(text);
                if res.is_none() {
                    trace!("Skipping malformed event log line: {text}");
                }
                res
            })
            .collect();

        let skip = events.len().saturating_sub(limit);
        events.drain(..skip);
        Ok(events)
    }
}


//------------ EventFormat ---------------------------------------------------

/// The format of newly appended lines.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EventFormat {
    /// The plain text format with literal separators.
    #[default]
    Text,

    /// One JSON object per line.
    Json,
}

impl<'de> Deserialize<'de> for EventFormat {
    fn deserialize<D>(d: D) -> Result<EventFormat, D::Error>
    where
        D: Deserializer<'de>,
    {
        let string = String::deserialize(d)?;
        match string.as_str() {
            "text" => Ok(EventFormat::Text),
            "json" => Ok(EventFormat::Json),
            _ => Err(de::Error::custom(format!(
                "expected \"text\" or \"json\", found: \"{string}\""
            ))),
        }
    }
}

impl fmt::Display for EventFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            EventFormat::Text => "text",
            EventFormat::Json => "json",
        })
    }
}


//------------ EventLogError -------------------------------------------------

#[derive(Debug)]
pub enum EventLogError {
    Io {
        context: Cow<'static, str>,
        err: io::Error,
    },
    Serialize(String),
    Other(String),
}

impl EventLogError {
    pub fn io(context: impl Into<Cow<'static, str>>, err: io::Error) -> Self {
        EventLogError::Io { context: context.into(), err }
    }

    fn other(info: impl Into<String>) -> Self {
        EventLogError::Other(info.into())
    }
}

impl fmt::Display for EventLogError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EventLogError::Io { context, err } => {
                write!(f, "{context}: {err}")
            }
            EventLogError::Serialize(err) => {
                write!(f, "failed to serialize event: {err}")
            }
            EventLogError::Other(s) => f.write_str(s)
        }
    }
}

impl error::Error for EventLogError { }


//============ Tests =========================================================
