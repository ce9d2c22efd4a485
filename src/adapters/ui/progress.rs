//! Polling spinner. Indicatif-based wait indicator for the status loop.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while waiting for backend processing. Finishes with a
/// cleared line so prompts render cleanly afterwards.
pub struct PollSpinner {
    bar: ProgressBar,
}

impl PollSpinner {
    pub fn start(upload_id: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!(
            "Processing {} (Ctrl-C to stop waiting)...",
            upload_id
        ));
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    pub fn set_message(&self, msg: impl Into<String>) {
        self.bar.set_message(msg.into());
    }

    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}
