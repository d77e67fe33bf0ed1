//! Configuration for the ahf command-line tool.
//!
//! Handles parsing command-line arguments and resolving them into a run
//! configuration: which way to go, where the output lands, and what to print.
//!
//! # Philosophy
//!
//! The tool should work with ONE argument. The direction is picked from the
//! input's extension (`.ahf` decompresses, anything else compresses) and the
//! output name is derived from the input unless given explicitly.

use std::path::{Path, PathBuf};

use ahf_core::container::EXTENSION;
use ahf_core::metrics::Direction;
use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "ahf", about = "Single-pass adaptive Huffman compressor", version)]
pub struct Cli {
    /// File to compress, or an .ahf file to decompress
    pub input: PathBuf,

    /// Output path (default: derived from the input name)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Direction of the run
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    pub mode: ModeArg,

    /// Report sizes in binary units (KiB, MiB) instead of SI (kB, MB)
    #[arg(long)]
    pub binary_units: bool,

    /// Don't draw a progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Don't print the detailed metrics summary
    #[arg(long)]
    pub no_metrics: bool,

    /// Print the resolved configuration before running
    #[arg(long)]
    pub print_config: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v', conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress logging
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Decompress `.ahf` inputs, compress everything else
    Auto,
    Compress,
    Decompress,
}

/// How byte counts are rendered for humans.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeUnits {
    /// Powers of 1000 (kB, MB, ...)
    Si,
    /// Powers of 1024 (KiB, MiB, ...)
    Binary,
}

/// Complete configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    // === Files ===
    /// Input file path
    pub input: PathBuf,

    /// Explicit output path (None = derive from input)
    pub output: Option<PathBuf>,

    // === Behavior ===
    pub direction: Direction,

    /// Whether to draw a progress bar
    pub show_progress: bool,

    /// Whether to print detailed metrics summary
    pub print_metrics: bool,

    /// Whether to print detailed config
    pub print_config: bool,

    /// Units for human-readable sizes
    pub units: SizeUnits,
}

impl Config {
    /// Resolve parsed arguments into a configuration.
    pub fn from_cli(cli: &Cli) -> Self {
        let direction = match cli.mode {
            ModeArg::Compress => Direction::Compress,
            ModeArg::Decompress => Direction::Decompress,
            ModeArg::Auto => direction_for(&cli.input),
        };

        Config {
            input: cli.input.clone(),
            output: cli.output.clone(),
            direction,
            show_progress: !cli.no_progress && !cli.quiet,
            print_metrics: !cli.no_metrics,
            print_config: cli.print_config,
            units: if cli.binary_units {
                SizeUnits::Binary
            } else {
                SizeUnits::Si
            },
        }
    }

    /// Extension of the input file, without the dot ("" if none).
    ///
    /// Returns `None` if the extension is not valid UTF-8.
    pub fn source_extension(&self) -> Option<&str> {
        match self.input.extension() {
            Some(ext) => ext.to_str(),
            None => Some(""),
        }
    }

    /// Where compressed output goes: `<stem>.ahf` next to the input.
    pub fn compressed_output(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension(EXTENSION))
    }

    /// Where decompressed output goes: `<stem>.<extension>` next to the input.
    pub fn decompressed_output(&self, extension: &str) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension(extension))
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        println!("Input file:  {}", self.input.display());
        match &self.output {
            Some(path) => println!("Output file: {}", path.display()),
            None => println!("Output file: (derived from input)"),
        }
        println!("Direction:   {}", self.direction.as_str());
        println!(
            "Size units:  {}",
            match self.units {
                SizeUnits::Si => "SI (1000)",
                SizeUnits::Binary => "binary (1024)",
            }
        );
        println!();
    }
}

/// Pick the direction from a file name.
pub fn direction_for(path: &Path) -> Direction {
    match path.extension() {
        Some(ext) if ext == EXTENSION => Direction::Decompress,
        _ => Direction::Compress,
    }
}
