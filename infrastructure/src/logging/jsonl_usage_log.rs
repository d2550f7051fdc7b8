//! JSONL file writer for usage events.
//!
//! Each [`UsageEvent`] becomes one JSON line carrying its payload plus `type`
//! and `timestamp`. Lines are handed to a writer thread over a channel, so
//! recording never waits on disk.

use council_application::ports::usage_log::{UsageEvent, UsageLog};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use tracing::warn;

/// Append-only JSONL usage log. Flushes and joins its writer on `Drop`.
pub struct JsonlUsageLog {
    sender: Mutex<Option<Sender<String>>>,
    writer: Option<JoinHandle<()>>,
    path: PathBuf,
}

impl JsonlUsageLog {
    /// Open `path` for appending, creating parent directories as needed.
    ///
    /// Returns `None` if the file cannot be opened; callers fall back to
    /// running without a usage log.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!("Could not create usage log directory {}: {}", parent.display(), e);
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open usage log {}: {}", path.display(), e);
                return None;
            }
        };

        let (sender, receiver) = mpsc::channel::<String>();
        let writer = std::thread::Builder::new()
            .name("usage-log".to_string())
            .spawn(move || write_lines(file, receiver));
        let writer = match writer {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not start usage log writer: {}", e);
                return None;
            }
        };

        Some(Self {
            sender: Mutex::new(Some(sender)),
            writer: Some(writer),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_lines(file: File, receiver: mpsc::Receiver<String>) {
    let mut writer = BufWriter::new(file);
    for line in receiver {
        if let Err(e) = writeln!(writer, "{}", line) {
            warn!("Usage log write failed: {}", e);
            continue;
        }
        // flush per line; the log is read while consultations are still running
        let _ = writer.flush();
    }
    let _ = writer.flush();
}

/// Merge the payload with `type` and `timestamp`
fn to_record(event: UsageEvent) -> Value {
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    match event.payload {
        Value::Object(mut map) => {
            map.insert("type".to_string(), Value::String(event.event_type.to_string()));
            map.insert("timestamp".to_string(), Value::String(timestamp));
            Value::Object(map)
        }
        other => serde_json::json!({
            "type": event.event_type,
            "timestamp": timestamp,
            "data": other,
        }),
    }
}

impl UsageLog for JsonlUsageLog {
    fn record(&self, event: UsageEvent) {
        let Ok(line) = serde_json::to_string(&to_record(event)) else {
            return;
        };
        if let Ok(sender) = self.sender.lock()
            && let Some(sender) = sender.as_ref()
        {
            let _ = sender.send(line);
        }
    }
}

impl Drop for JsonlUsageLog {
    fn drop(&mut self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
    }
}
