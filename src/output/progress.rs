//! Progress reporting
//!
//! Line-oriented progress output for batch run polling.

use std::io::Write;
use std::sync::Mutex;

/// Sink for human-readable batch run progress
///
/// The poll loop writes through this trait so the same code path serves the
/// console and capture-based tests.
pub trait ProgressSink: Send + Sync {
    /// Emit one full line of output
    fn line(&self, text: &str);

    /// Emit a keep-alive dot without a newline
    ///
    /// Prevents "long time no output" watchdogs on CI services from killing
    /// long-running waits.
    fn dot(&self);
}

/// Progress sink writing to standard output
pub struct ConsoleSink {
    enabled: bool,
}

impl ConsoleSink {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl ProgressSink for ConsoleSink {
    fn line(&self, text: &str) {
        if self.enabled {
            println!("{text}");
        }
    }

    fn dot(&self) {
        if self.enabled {
            print!(".");
            let _ = std::io::stdout().flush();
        }
    }
}

/// Progress sink collecting lines in memory (useful for testing)
#[derive(Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All lines emitted so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl ProgressSink for MemorySink {
    fn line(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }

    fn dot(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_collects_lines() {
        let sink = MemorySink::new();
        sink.line("first");
        sink.dot();
        sink.line("second");
        assert_eq!(sink.lines(), vec!["first", "second"]);
    }
}
