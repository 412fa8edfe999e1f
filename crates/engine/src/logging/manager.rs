//! Per-slot captured output with a file mirror.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use quay_util::encode_file_component;
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};
use tracing::{debug, warn};

use super::{DEFAULT_MAX_LINES_PER_SLOT, LogLine, LogRingBuffer, LogStream};

#[derive(Debug)]
struct SlotLog {
    buffer: LogRingBuffer,
    file: Option<File>,
}

/// Stores captured output for every slot key.
#[derive(Debug, Clone)]
pub struct LogManager {
    slots: Arc<Mutex<HashMap<String, SlotLog>>>,
    directory: PathBuf,
    max_lines_per_slot: usize,
    /// Also print stdout/stderr lines to this process's stdout.
    echo: bool,
}

impl LogManager {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            directory: directory.into(),
            max_lines_per_slot: DEFAULT_MAX_LINES_PER_SLOT,
            echo: false,
        }
    }

    pub fn with_max_lines(mut self, max_lines: usize) -> Self {
        self.max_lines_per_slot = max_lines;
        self
    }

    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Mirror file for `slot_key`.
    pub fn log_path(&self, slot_key: &str) -> PathBuf {
        self.directory.join(format!("{}.log", encode_file_component(slot_key)))
    }

    /// Clear the buffer and truncate the mirror file.
    pub async fn reset(&self, slot_key: &str) -> io::Result<()> {
        fs::create_dir_all(&self.directory).await?;
        let file = File::create(self.log_path(slot_key)).await?;
        let mut slots = self.slots.lock().await;
        let slot = slots.entry(slot_key.to_string()).or_insert_with(|| SlotLog {
            buffer: LogRingBuffer::new(self.max_lines_per_slot),
            file: None,
        });
        slot.buffer.clear();
        slot.file = Some(file);
        debug!(slot_key = %slot_key, path = %self.log_path(slot_key).display(), "captured log reset");
        Ok(())
    }

    /// Append a line to the buffer and the mirror file.
    ///
    /// A failing file write is logged and the line stays in memory.
    pub async fn append(&self, slot_key: &str, line: LogLine) {
        if self.echo && line.stream != LogStream::System {
            println!("{}", line.text);
        }

        let mut slots = self.slots.lock().await;
        let slot = slots.entry(slot_key.to_string()).or_insert_with(|| SlotLog {
            buffer: LogRingBuffer::new(self.max_lines_per_slot),
            file: None,
        });
        if slot.file.is_none() {
            slot.file = self.open_for_append(slot_key).await.ok();
        }
        if let Some(file) = slot.file.as_mut() {
            let rendered = format!("{}\n", line.render());
            let written = match file.write_all(rendered.as_bytes()).await {
                Ok(()) => file.flush().await,
                Err(error) => Err(error),
            };
            if let Err(error) = written {
                warn!(slot_key = %slot_key, error = %error, "failed to mirror captured line");
                slot.file = None;
            }
        }
        slot.buffer.push(line);
    }

    pub async fn recent(&self, slot_key: &str, count: usize) -> Vec<LogLine> {
        let slots = self.slots.lock().await;
        slots.get(slot_key).map_or_else(Vec::new, |slot| slot.buffer.recent(count))
    }

    pub async fn all(&self, slot_key: &str) -> Vec<LogLine> {
        let slots = self.slots.lock().await;
        slots.get(slot_key).map_or_else(Vec::new, |slot| slot.buffer.all())
    }

    /// Contents of the mirror file, which outlives this process.
    pub async fn read_file(&self, slot_key: &str) -> io::Result<String> {
        fs::read_to_string(self.log_path(slot_key)).await
    }

    async fn open_for_append(&self, slot_key: &str) -> io::Result<File> {
        fs::create_dir_all(&self.directory).await?;
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(slot_key))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn lines_are_buffered_and_mirrored() {
        let dir = tempdir().unwrap();
        let manager = LogManager::new(dir.path());
        let key = "build[~/proj]";

        manager.reset(key).await.unwrap();
        manager.append(key, LogLine::new(LogStream::System, "$ make")).await;
        manager.append(key, LogLine::new(LogStream::Stdout, "compiling")).await;

        let lines = manager.recent(key, 10).await;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].text, "compiling");

        let path = manager.log_path(key);
        assert_eq!(path.file_name().unwrap(), "build___proj_.log");
        assert_eq!(manager.read_file(key).await.unwrap(), "# $ make\ncompiling\n");
    }

    #[tokio::test]
    async fn reset_clears_buffer_and_truncates_file() {
        let dir = tempdir().unwrap();
        let manager = LogManager::new(dir.path().join("nested"));
        let key = "test[/proj]";

        manager.append(key, LogLine::new(LogStream::Stderr, "old failure")).await;
        manager.reset(key).await.unwrap();
        manager.append(key, LogLine::new(LogStream::Stdout, "fresh")).await;

        let texts: Vec<_> = manager.all(key).await.into_iter().map(|line| line.text).collect();
        assert_eq!(texts, vec!["fresh"]);
        assert_eq!(manager.read_file(key).await.unwrap(), "fresh\n");
    }

    #[tokio::test]
    async fn buffer_is_bounded_per_slot() {
        let dir = tempdir().unwrap();
        let manager = LogManager::new(dir.path()).with_max_lines(3);
        for index in 0..10 {
            manager.append("a[x]", LogLine::new(LogStream::Stdout, index.to_string())).await;
        }
        manager.append("b[x]", LogLine::new(LogStream::Stdout, "other")).await;
        assert_eq!(manager.all("a[x]").await.len(), 3);
        assert_eq!(manager.all("b[x]").await.len(), 1);
        assert!(manager.recent("missing", 5).await.is_empty());
    }
}
