// src/record/mod.rs
// =============================================================================
// Where crawl results go.
//
// A Recorder receives two append-only streams from all workers at once:
// - visited URLs (the crawl's output)
// - timestamped error messages (failed fetches, failed writes)
//
// Implementations serialize appends themselves, so workers can call them
// without any extra locking.
// =============================================================================

mod file;
#[cfg(test)]
mod memory;

use std::io;

use chrono::{DateTime, Utc};

pub use file::FileRecorder;
#[cfg(test)]
pub use memory::MemoryRecorder;

pub trait Recorder: Send + Sync {
    /// Appends one processed URL to the output.
    fn record_visited(&self, url: &str) -> io::Result<()>;

    /// Appends one entry to the error log. Never fails the caller.
    fn record_error(&self, message: &str, timestamp: DateTime<Utc>);
}

/// Formats one error log line (without the trailing newline).
pub fn format_error_line(message: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "[{}] {}",
        timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_error_line_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            format_error_line("failed to fetch https://a.test/b: HTTP 500", at),
            "[2024-03-09T14:05:07Z] failed to fetch https://a.test/b: HTTP 500"
        );
    }
}
