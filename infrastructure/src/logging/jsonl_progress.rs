//! JSONL file writer for benchmark progress events.
//!
//! Each event is serialized as a single JSON line with a `type` field and an
//! RFC3339 `timestamp`, appended through a buffered writer.

use quorum_application::{BenchmarkProgressNotifier, QuestionProgress};
use quorum_domain::BenchmarkOutput;
use serde_json::{Value, json};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// JSONL progress logger that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and on
/// `Drop`.
pub struct JsonlProgressLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlProgressLogger {
    /// Create a new logger writing to the given path.
    ///
    /// Creates the file (and parent directories) if they don't exist.
    /// Returns `None` if the file cannot be created.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(
                    "Could not create progress log directory {}: {}",
                    parent.display(),
                    e
                );
                return None;
            }
        }

        let file = match File::create(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not create progress log file {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn log(&self, event_type: &str, payload: Value) {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);

        let record = match payload {
            Value::Object(mut map) => {
                map.insert("type".to_string(), Value::String(event_type.to_string()));
                map.insert("timestamp".to_string(), Value::String(timestamp));
                Value::Object(map)
            }
            other => json!({
                "type": event_type,
                "timestamp": timestamp,
                "data": other,
            }),
        };

        let Ok(line) = serde_json::to_string(&record) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", line);
            let _ = writer.flush();
        }
    }
}

impl BenchmarkProgressNotifier for JsonlProgressLogger {
    fn on_run_start(&self, dataset: &str, total: usize, pending: usize) {
        self.log(
            "run_start",
            json!({ "dataset": dataset, "total": total, "pending": pending }),
        );
    }

    fn on_question_complete(&self, progress: &QuestionProgress) {
        let payload = serde_json::to_value(progress).unwrap_or(Value::Null);
        self.log("question_complete", payload);
    }

    fn on_run_complete(&self, output: &BenchmarkOutput) {
        self.log(
            "run_complete",
            json!({
                "dataset": output.dataset,
                "questions": output.runs.len(),
                "totalCostUsd": output.total_cost(),
                "totalDurationMs": output.total_duration_ms(),
            }),
        );
    }
}

impl Drop for JsonlProgressLogger {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
