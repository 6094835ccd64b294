use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use codesift::{find_valid_codes, write_codes};

#[derive(Parser)]
#[command(name = "codesift")]
#[command(about = "External-memory intersection engine for promotional code corpora")]
#[command(
    long_about = "Codesift distills the list of valid promotional codes from a directory of
line-delimited input files that collectively do not fit in memory.

A code is valid when:
  1. Its length is 8-10 bytes, and
  2. It appears in at least two distinct input files.

The corpus is streamed once and hash-partitioned into on-disk buckets under
the system temp root, then each bucket is reduced in parallel. Expect minutes
of wall clock and bounded memory for corpora in the hundreds of millions of
records. Progress is printed to stdout with an elapsed-time prefix."
)]
#[command(after_help = "EXAMPLES:
  # Distill valid codes from a corpus directory
  codesift --input ./couponbase --output valid_codes.txt

  # Pin the reduction pool to 4 workers, with diagnostics on stderr
  codesift -i ./couponbase -w 4 -v")]
struct Cli {
    /// Directory containing promo-code input files.
    /// Sub-directories are skipped, not recursed.
    #[arg(short, long)]
    input: PathBuf,

    /// Output artifact path (overwritten if present)
    #[arg(short, long, default_value = "valid_codes.txt")]
    output: PathBuf,

    /// Worker threads for bucket reduction (0 = all available cores)
    #[arg(short, long, default_value_t = 0)]
    workers: usize,

    /// Enable verbose diagnostic logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    codesift::logging::init_logger(cli.verbose);

    if !cli.input.is_dir() {
        bail!("input directory '{}' does not exist", cli.input.display());
    }

    println!("Promo Code Pre-compute Tool");
    println!("===========================");
    println!();
    println!("Input directory: {}", cli.input.display());
    println!("Output file: {}", cli.output.display());
    println!();

    let program_start = Instant::now();
    let progress = move |msg: &str| {
        println!("[{}] {}", format_elapsed(program_start.elapsed()), msg);
    };

    let processing_start = Instant::now();
    let codes = find_valid_codes(&cli.input, Some(&progress), cli.workers)
        .context("pre-computation failed")?;
    let processing_time = processing_start.elapsed();

    progress("Writing output file...");
    write_codes(&codes, &cli.output)
        .with_context(|| format!("failed to write output to '{}'", cli.output.display()))?;

    println!();
    println!("Success!");
    println!("  Valid codes found: {}", codes.len());
    println!("  Processing time: {}", format_elapsed(processing_time));
    println!("  Output file: {}", cli.output.display());
    println!();

    Ok(())
}

/// Format a duration as a compact elapsed-time string: "42s" or "3m07s".
fn format_elapsed(d: Duration) -> String {
    let total_secs = d.as_secs_f64().round() as u64;
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;

    if minutes > 0 {
        format!("{}m{:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::ZERO), "0s");
        assert_eq!(format_elapsed(Duration::from_secs(1)), "1s");
        assert_eq!(format_elapsed(Duration::from_secs(59)), "59s");
        assert_eq!(format_elapsed(Duration::from_secs(29 * 60 + 59)), "29m59s");
        assert_eq!(format_elapsed(Duration::from_secs(159 * 60 + 59)), "159m59s");
    }

    #[test]
    fn test_format_elapsed_rounds_to_nearest_second() {
        assert_eq!(format_elapsed(Duration::from_millis(400)), "0s");
        assert_eq!(format_elapsed(Duration::from_millis(61_700)), "1m02s");
    }
}
