//! Progress observation for long-running encode/decode calls.
//!
//! The codec calls `on_progress(processed, total)` after every symbol.
//! `processed` counts bytes taken from the input so far and `total` is the
//! input size the caller announced (0 when unknown). Observers only see
//! counters; they cannot influence the coding.

/// Receives progress updates from the codec.
pub trait Progress {
    fn on_progress(&mut self, processed: u64, total: u64);
}

impl<F> Progress for F
where
    F: FnMut(u64, u64),
{
    fn on_progress(&mut self, processed: u64, total: u64) {
        self(processed, total)
    }
}

/// Observer that ignores every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn on_progress(&mut self, _processed: u64, _total: u64) {}
}

/// Integer percentage of `processed` over `total`, rounded up and capped at 100.
///
/// An unknown (zero) total reports 100.
pub fn percent(processed: u64, total: u64) -> u64 {
    if total == 0 {
        return 100;
    }
    (processed.saturating_mul(100).div_ceil(total)).min(100)
}
