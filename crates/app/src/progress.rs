//! Terminal progress bar fed by the codec's progress callbacks.

use ahf_core::progress::{percent, Progress};
use indicatif::{ProgressBar, ProgressStyle};

/// Draws a percentage bar on stderr.
///
/// The codec reports after every byte; the bar is only touched when the
/// rounded percentage changes.
pub struct ProgressReporter {
    bar: ProgressBar,
    last_percent: Option<u64>,
}

impl ProgressReporter {
    pub fn new(enabled: bool, label: &'static str) -> Self {
        let bar = if enabled {
            ProgressBar::new(100)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::with_template("{msg:>12} [{bar:40.cyan/blue}] {pos:>3}%") {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(label);

        Self {
            bar,
            last_percent: None,
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Progress for ProgressReporter {
    fn on_progress(&mut self, processed: u64, total: u64) {
        let now = percent(processed, total);
        if self.last_percent != Some(now) {
            self.last_percent = Some(now);
            self.bar.set_position(now);
        }
    }
}
