// In-memory recorder for crawl tests.

use std::io;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{format_error_line, Recorder};

#[derive(Debug, Default)]
pub struct MemoryRecorder {
    visited: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Recorder for MemoryRecorder {
    fn record_visited(&self, url: &str) -> io::Result<()> {
        self.visited.lock().unwrap().push(url.to_string());
        Ok(())
    }

    fn record_error(&self, message: &str, timestamp: DateTime<Utc>) {
        self.errors
            .lock()
            .unwrap()
            .push(format_error_line(message, timestamp));
    }
}
