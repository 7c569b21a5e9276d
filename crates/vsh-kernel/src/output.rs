//! Where command output goes.
//!
//! The kernel returns every line's stdout in its `PipelineResult` and, when a
//! sink is attached, also writes it there. Background jobs have no caller
//! waiting for a result, so a sink is the only place their output and
//! completion notices appear.

use std::sync::{Mutex, PoisonError};

/// How a piece of text should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleHint {
    /// Ordinary command output.
    Output,
    /// An error message.
    Error,
    /// Shell status messages such as job completion.
    Notice,
}

/// Receiver for text the user should see.
pub trait OutputSink: Send + Sync {
    fn write(&self, text: &str, style: StyleHint);
}

/// A sink that keeps everything it is given.
#[derive(Debug, Default)]
pub struct BufferSink {
    entries: Mutex<Vec<(StyleHint, String)>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, in order.
    pub fn entries(&self) -> Vec<(StyleHint, String)> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Concatenated text written with `style`.
    pub fn text(&self, style: StyleHint) -> String {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(s, _)| *s == style)
            .map(|(_, text)| text.as_str())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl OutputSink for BufferSink {
    fn write(&self, text: &str, style: StyleHint) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((style, text.to_string()));
    }
}
