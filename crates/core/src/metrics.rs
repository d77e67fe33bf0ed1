//! Metrics collection and reporting for compress/decompress runs.
//!
//! This module provides observable insights into a run:
//! - Throughput (bytes in/out)
//! - Compression ratio
//! - Coding statistics (symbols, escapes, tree rebuilds)
//! - Timing information
//!
//! # Thread Safety
//!
//! The `Metrics` struct is NOT thread-safe. Runs are single-threaded and
//! own their metrics outright.

use std::time::{Duration, Instant};

use crate::codec::Summary;

/// Which way a run went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Compress,
    Decompress,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Compress => "compress",
            Direction::Decompress => "decompress",
        }
    }
}

/// Counts and timing for one run.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub direction: Direction,

    // === Timing ===
    /// When the run started
    pub start_time: Instant,

    /// When the run ended (set on completion)
    pub end_time: Option<Instant>,

    // === Input/Output ===
    /// Size of the source file
    pub input_bytes: u64,

    /// Size of the produced file
    pub output_bytes: u64,

    // === Coding ===
    /// Data symbols coded
    pub symbols: u64,

    /// Symbols introduced through ESCAPE
    pub escapes: u64,

    /// Tree rebuilds
    pub rebuilds: u64,

    /// Bits spent on the coded body
    pub code_bits: u64,
}

impl Metrics {
    /// Create new metrics with start time set to now.
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            start_time: Instant::now(),
            end_time: None,
            input_bytes: 0,
            output_bytes: 0,
            symbols: 0,
            escapes: 0,
            rebuilds: 0,
            code_bits: 0,
        }
    }

    /// Fold a codec summary into the metrics.
    ///
    /// The summary counts bytes the codec itself touched; file sizes set by
    /// the caller are kept if already larger.
    pub fn record(&mut self, summary: &Summary) {
        self.input_bytes = self.input_bytes.max(summary.bytes_read);
        self.output_bytes = self.output_bytes.max(summary.bytes_written);
        self.symbols += summary.stats.symbols;
        self.escapes += summary.stats.escapes;
        self.rebuilds += summary.stats.rebuilds;
        self.code_bits += summary.stats.code_bits;
    }

    /// Mark the run as complete.
    pub fn complete(&mut self) {
        self.end_time = Some(Instant::now());
    }

    /// Get total duration (or current elapsed if not complete).
    pub fn duration(&self) -> Duration {
        match self.end_time {
            Some(end) => end.duration_since(self.start_time),
            None => self.start_time.elapsed(),
        }
    }

    /// Compute compression ratio (output / input).
    ///
    /// Returns 0.0 if there was no input.
    pub fn compression_ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            0.0
        } else {
            self.output_bytes as f64 / self.input_bytes as f64
        }
    }

    /// Output size as a whole percentage of the input, rounded up.
    ///
    /// An empty input counts as one byte so the ratio stays defined.
    pub fn ratio_percent(&self) -> u64 {
        let input = self.input_bytes.max(1);
        (self.output_bytes * 100).div_ceil(input)
    }

    /// Average code length per data symbol, in bits.
    pub fn bits_per_symbol(&self) -> f64 {
        if self.symbols == 0 {
            0.0
        } else {
            self.code_bits as f64 / self.symbols as f64
        }
    }

    /// Compute throughput in bytes/second.
    pub fn throughput_bps(&self) -> f64 {
        let duration_secs = self.duration().as_secs_f64();
        if duration_secs == 0.0 {
            0.0
        } else {
            self.input_bytes as f64 / duration_secs
        }
    }

    /// Print a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n=== {} summary ===", self.direction.as_str());
        println!("Duration: {}", format_elapsed(self.duration()));
        println!();

        println!("Input:  {} bytes ({:.2} MiB)", self.input_bytes, self.input_bytes as f64 / 1024.0 / 1024.0);
        println!("Output: {} bytes ({:.2} MiB)", self.output_bytes, self.output_bytes as f64 / 1024.0 / 1024.0);
        println!("Ratio: {}%", self.ratio_percent());
        println!();

        println!("=== Coding ===");
        println!("Symbols: {}", self.symbols);
        println!("New symbols (escapes): {}", self.escapes);
        println!("Tree rebuilds: {}", self.rebuilds);
        println!("Bits per symbol: {:.3}", self.bits_per_symbol());
        println!();

        println!("=== Performance ===");
        println!("Throughput: {:.2} MB/s", self.throughput_bps() / 1_000_000.0);
        println!();
    }

    /// Export metrics as a simple text format (for parsing/testing).
    pub fn export_text(&self) -> String {
        format!(
            "direction={}\n\
             duration_ms={}\n\
             input_bytes={}\n\
             output_bytes={}\n\
             compression_ratio={:.4}\n\
             symbols={}\n\
             escapes={}\n\
             rebuilds={}\n\
             code_bits={}\n",
            self.direction.as_str(),
            self.duration().as_millis(),
            self.input_bytes,
            self.output_bytes,
            self.compression_ratio(),
            self.symbols,
            self.escapes,
            self.rebuilds,
            self.code_bits,
        )
    }
}

/// Format a duration as `h:m:s:ms`, hours wrapping at 24.
pub fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    let secs = ms / 1000;
    format!(
        "{}:{}:{}:{}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60,
        ms % 1000
    )
}
