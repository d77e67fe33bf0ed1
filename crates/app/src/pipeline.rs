//! File-level compress and decompress runs.
//!
//! Each run opens its files, drives the core container API with a fresh
//! code tree, and removes the partially written output if anything fails.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use ahf_core::container;
use ahf_core::metrics::{Direction, Metrics};
use anyhow::{anyhow, bail, Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::progress::ProgressReporter;

/// What a successful run produced.
#[derive(Debug)]
pub struct Outcome {
    pub output: PathBuf,
    pub metrics: Metrics,
}

/// Run the configured direction.
pub fn run(config: &Config) -> Result<Outcome> {
    match config.direction {
        Direction::Compress => compress_file(config),
        Direction::Decompress => decompress_file(config),
    }
}

fn compress_file(config: &Config) -> Result<Outcome> {
    let mut metrics = Metrics::new(Direction::Compress);

    let extension = config
        .source_extension()
        .ok_or_else(|| anyhow!("input extension of {} is not valid UTF-8", config.input.display()))?;
    let (source, total) = open_input(&config.input)?;
    metrics.input_bytes = total;

    let output = config.compressed_output();
    ensure_distinct(&config.input, &output)?;
    let sink = File::create(&output).with_context(|| format!("cannot create {}", output.display()))?;

    info!(input = %config.input.display(), output = %output.display(), total, "compressing");
    let mut progress = ProgressReporter::new(config.show_progress, "compressing");
    let result = container::compress(extension, source, sink, total, &mut progress);
    progress.finish();

    let summary = keep_or_remove(result, &output)?;
    metrics.record(&summary);
    metrics.output_bytes = file_len(&output)?;
    metrics.complete();

    Ok(Outcome { output, metrics })
}

fn decompress_file(config: &Config) -> Result<Outcome> {
    let mut metrics = Metrics::new(Direction::Decompress);

    let (source, total) = open_input(&config.input)?;
    metrics.input_bytes = total;

    let archive = container::open(source)
        .with_context(|| format!("cannot read header of {}", config.input.display()))?;

    let output = config.decompressed_output(archive.extension());
    ensure_distinct(&config.input, &output)?;
    let sink = File::create(&output).with_context(|| format!("cannot create {}", output.display()))?;

    info!(input = %config.input.display(), output = %output.display(), total, "decompressing");
    let mut progress = ProgressReporter::new(config.show_progress, "decompressing");
    let result = archive.decode_into(sink, total, &mut progress);
    progress.finish();

    let summary = keep_or_remove(result, &output)?;
    metrics.record(&summary);
    metrics.output_bytes = file_len(&output)?;
    metrics.complete();

    Ok(Outcome { output, metrics })
}

fn open_input(path: &Path) -> Result<(File, u64)> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("cannot stat {}", path.display()))?
        .len();
    Ok((file, len))
}

fn file_len(path: &Path) -> Result<u64> {
    Ok(fs::metadata(path)
        .with_context(|| format!("cannot stat {}", path.display()))?
        .len())
}

/// Refuse to truncate the input by writing over it.
fn ensure_distinct(input: &Path, output: &Path) -> Result<()> {
    let same = match (fs::canonicalize(input), output.exists()) {
        (Ok(input), true) => fs::canonicalize(output).map(|o| o == input).unwrap_or(false),
        _ => input == output,
    };
    if same {
        bail!("output {} would overwrite the input", output.display());
    }
    Ok(())
}

/// Pass a successful result through; on failure delete the partial output.
fn keep_or_remove<T>(result: ahf_core::Result<T>, output: &Path) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Err(remove_err) = fs::remove_file(output) {
                warn!(path = %output.display(), error = %remove_err, "could not remove partial output");
            }
            Err(err).with_context(|| format!("failed while writing {}", output.display()))
        }
    }
}
