//! Provisioning phase timing.

use std::time::Instant;

/// A simple timer for measuring provisioning phase durations.
pub struct Timer {
    name: &'static str,
    start: Instant,
}

impl Timer {
    /// Start a new timer with the given phase name.
    pub fn start(name: &'static str) -> Self {
        Self {
            name,
            start: Instant::now(),
        }
    }

    /// Finish the timer and print the elapsed time.
    pub fn finish(self) {
        let secs = self.start.elapsed().as_secs_f64();
        println!("  [{}] {}", format_duration(secs), self.name);
    }
}

/// Render a duration in seconds as "12.3s" or "2.1m".
pub fn format_duration(secs: f64) -> String {
    if secs >= 60.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}s", secs)
    }
}
