//! Terminal output for the REPL.
//!
//! Command output is written through [`TerminalSink`], which the kernel
//! calls for foreground results and for background jobs as they finish.
//! Colors are only used when the stream is a terminal.

use std::io::{IsTerminal, Write};

use vsh_kernel::{JobInfo, OutputSink, StyleHint};

const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Writes kernel output to stdout and errors to stderr.
#[derive(Debug, Clone, Copy)]
pub struct TerminalSink {
    color: bool,
}

impl TerminalSink {
    pub fn new() -> Self {
        Self {
            color: std::io::stdout().is_terminal() && std::io::stderr().is_terminal(),
        }
    }

    /// A sink that never emits escape codes.
    pub fn plain() -> Self {
        Self { color: false }
    }
}

impl Default for TerminalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for TerminalSink {
    fn write(&self, text: &str, style: StyleHint) {
        let result = match style {
            StyleHint::Output => {
                let mut out = std::io::stdout().lock();
                out.write_all(text.as_bytes()).and_then(|_| out.flush())
            }
            StyleHint::Error => {
                let mut err = std::io::stderr().lock();
                write!(err, "{}", paint(text, RED, self.color)).and_then(|_| err.flush())
            }
            StyleHint::Notice => {
                let mut err = std::io::stderr().lock();
                write!(err, "{}", paint(text, DIM, self.color)).and_then(|_| err.flush())
            }
        };
        if let Err(e) = result {
            tracing::warn!("Failed to write output: {}", e);
        }
    }
}

fn paint(text: &str, color: &str, enabled: bool) -> String {
    if enabled {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// One line per job, as shown by `/jobs`.
pub fn format_jobs(jobs: &[JobInfo]) -> String {
    if jobs.is_empty() {
        return "(no background jobs)".to_string();
    }
    let mut output = String::from("Background jobs:");
    for job in jobs {
        output.push_str(&format!("\n  [{}] {:<10} {}", job.id, job.state.to_string(), job.command));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsh_kernel::{JobId, JobState};

    #[test]
    fn paint_respects_color_flag() {
        assert_eq!(paint("x", RED, false), "x");
        assert_eq!(paint("x", RED, true), "\x1b[31mx\x1b[0m");
    }

    #[test]
    fn job_listing() {
        assert_eq!(format_jobs(&[]), "(no background jobs)");

        let jobs = vec![JobInfo {
            id: JobId(3),
            command: "sleep 10".to_string(),
            state: JobState::Running,
        }];
        let listing = format_jobs(&jobs);
        assert!(listing.starts_with("Background jobs:"));
        assert!(listing.contains("[3] Running"), "{}", listing);
        assert!(listing.ends_with("sleep 10"));
    }
}
