//! Progress reporting for the copy worker.
//!
//! The worker talks to a `Reporter` trait so the core is not coupled to the
//! console; tests capture lines in memory instead.

use crate::state::ProgressSnapshot;

/// Sink for progress lines, status lines, and error lines.
///
/// Implementations keep no state of their own and must not block the caller
/// beyond the cost of the underlying write.
pub trait Reporter: Send + Sync {
    /// Called once per chunk callback and once for the final forced update.
    fn progress(&self, snapshot: &ProgressSnapshot);

    /// Terminal status lines ("Copy thread finished." etc).
    fn status(&self, message: &str);

    /// Error lines; implementations add the `ERROR:` prefix.
    fn error(&self, message: &str);
}

pub fn format_progress_line(snapshot: &ProgressSnapshot) -> String {
    format!(
        "Copy progress is {}% and Offloading is {}",
        snapshot.percent,
        if snapshot.offloaded { "ENABLED" } else { "DISABLED" }
    )
}

/// Prints progress and status to stdout and errors to stderr.
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn progress(&self, snapshot: &ProgressSnapshot) {
        println!("{}", format_progress_line(snapshot));
    }

    fn status(&self, message: &str) {
        println!("{}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("ERROR: {}", message);
    }
}

/// A reporter that discards everything. Useful for headless runs.
pub struct NullReporter;

impl Reporter for NullReporter {
    fn progress(&self, _snapshot: &ProgressSnapshot) {}
    fn status(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Captures everything in memory, for assertions in unit tests.
#[cfg(test)]
pub struct MemoryReporter {
    pub lines: std::sync::Mutex<Vec<String>>,
    pub statuses: std::sync::Mutex<Vec<String>>,
    pub errors: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MemoryReporter {
    pub fn new() -> Self {
        Self {
            lines: std::sync::Mutex::new(Vec::new()),
            statuses: std::sync::Mutex::new(Vec::new()),
            errors: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn percents(&self) -> Vec<u8> {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .map(|line| {
                let start = "Copy progress is ".len();
                let end = line.find('%').unwrap();
                line[start..end].parse().unwrap()
            })
            .collect()
    }
}

#[cfg(test)]
impl Reporter for MemoryReporter {
    fn progress(&self, snapshot: &ProgressSnapshot) {
        self.lines.lock().unwrap().push(format_progress_line(snapshot));
    }

    fn status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_line_with_offload_enabled() {
        let snap = ProgressSnapshot {
            percent: 24,
            bytes_transferred: 250,
            bytes_total: 1000,
            offloaded: true,
        };
        assert_eq!(
            format_progress_line(&snap),
            "Copy progress is 24% and Offloading is ENABLED"
        );
    }

    #[test]
    fn progress_line_with_offload_disabled() {
        let snap = ProgressSnapshot {
            percent: 100,
            bytes_transferred: 1000,
            bytes_total: 1000,
            offloaded: false,
        };
        assert_eq!(
            format_progress_line(&snap),
            "Copy progress is 100% and Offloading is DISABLED"
        );
    }
}
