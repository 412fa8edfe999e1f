//! Captured-log output surfaces.
//!
//! Each slot key owns a bounded in-memory buffer and a mirror file under the
//! configured log directory.

mod manager;
mod ring_buffer;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use manager::LogManager;
pub use ring_buffer::LogRingBuffer;

/// Lines kept in memory per slot.
pub const DEFAULT_MAX_LINES_PER_SLOT: usize = 1000;

/// Origin of a captured line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStream {
    Stdout,
    Stderr,
    /// Lines written by quay itself (command header, exit status).
    System,
}

impl fmt::Display for LogStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogStream::Stdout => "stdout",
            LogStream::Stderr => "stderr",
            LogStream::System => "system",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    pub timestamp: DateTime<Utc>,
    pub stream: LogStream,
    pub text: String,
}

impl LogLine {
    pub fn new(stream: LogStream, text: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            stream,
            text: text.into(),
        }
    }

    /// Text as written to the mirror file.
    pub fn render(&self) -> String {
        match self.stream {
            LogStream::System => format!("# {}", self.text),
            LogStream::Stdout | LogStream::Stderr => self.text.clone(),
        }
    }
}
