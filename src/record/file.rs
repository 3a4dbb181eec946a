// src/record/file.rs
// =============================================================================
// Records results to two files on disk.
//
// - The visited file is truncated when the run starts, one URL per line
// - The error log is opened in append mode so earlier runs are kept
// - Every line is flushed right away: a crash mid-crawl loses nothing written
// =============================================================================

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::error;

use super::{format_error_line, Recorder};

#[derive(Debug)]
pub struct FileRecorder {
    visited: Mutex<BufWriter<File>>,
    errors: Mutex<BufWriter<File>>,
}

impl FileRecorder {
    pub fn create(visited_path: &Path, error_log_path: &Path) -> io::Result<Self> {
        let visited = File::create(visited_path)?;
        let errors = OpenOptions::new()
            .create(true)
            .append(true)
            .open(error_log_path)?;

        Ok(Self {
            visited: Mutex::new(BufWriter::new(visited)),
            errors: Mutex::new(BufWriter::new(errors)),
        })
    }
}

fn append_line(sink: &Mutex<BufWriter<File>>, line: &str) -> io::Result<()> {
    let mut writer = sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    writeln!(writer, "{}", line)?;
    writer.flush()
}

impl Recorder for FileRecorder {
    fn record_visited(&self, url: &str) -> io::Result<()> {
        append_line(&self.visited, url)
    }

    fn record_error(&self, message: &str, timestamp: DateTime<Utc>) {
        let line = format_error_line(message, timestamp);
        if let Err(e) = append_line(&self.errors, &line) {
            // Nowhere left to write it but the log
            error!("could not write error log entry '{}': {}", line, e);
        }
    }
}
