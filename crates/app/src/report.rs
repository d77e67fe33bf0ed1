//! Human-readable reporting of a finished run.

use std::path::Path;

use ahf_core::metrics::{format_elapsed, Metrics};
use humansize::{format_size, BINARY, DECIMAL};

use crate::config::SizeUnits;

/// Render a byte count, e.g. `1.50 kB` or `1.46 KiB`.
pub fn human_size(bytes: u64, units: SizeUnits) -> String {
    match units {
        SizeUnits::Si => format_size(bytes, DECIMAL),
        SizeUnits::Binary => format_size(bytes, BINARY),
    }
}

/// Print the one-screen result of a run.
pub fn print_outcome(metrics: &Metrics, output: &Path, units: SizeUnits, detailed: bool) {
    println!("Output:            {}", output.display());
    println!("Source size:       {}", human_size(metrics.input_bytes, units));
    println!("Received size:     {}", human_size(metrics.output_bytes, units));
    println!("Compression ratio: {} %", metrics.ratio_percent());
    println!("Elapsed time:      {}", format_elapsed(metrics.duration()));

    if detailed {
        metrics.print_summary();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size_small() {
        assert_eq!(human_size(0, SizeUnits::Si), "0 B");
        assert_eq!(human_size(999, SizeUnits::Si), "999 B");
    }

    #[test]
    fn test_human_size_units() {
        let si = human_size(1_500, SizeUnits::Si);
        let binary = human_size(1_500, SizeUnits::Binary);
        assert!(si.ends_with("kB"), "{si}");
        assert!(binary.ends_with("KiB"), "{binary}");

        assert!(human_size(3 * 1024 * 1024, SizeUnits::Binary).ends_with("MiB"));
    }
}
