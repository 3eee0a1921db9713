//! Command-line interface definition.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Enumerate, count, and cross-check the theoretical RNA-seq reads derivable
/// from annotated transcript sequences.
#[derive(Parser, Debug)]
#[command(name = "txreads")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Logging filter written to stderr (e.g. "info", "txreads=debug")
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Emit every unique theoretical read per gene as a FASTA-like stream
    Reads(WindowArgs),
    /// Emit per-gene unique theoretical read counts as CSV
    Count(WindowArgs),
    /// Compare theoretical read counts against reads in an alignment file
    Match(MatchArgs),
    /// Emit per-gene exon-union and maximum transcript lengths as CSV
    GeneLengths(GeneLengthsArgs),
}

#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Transcript annotation in GTF format (plain or gzipped)
    #[arg(short, long)]
    pub gtf: PathBuf,

    /// Transcript sequences in FASTA format (plain or gzipped)
    #[arg(short, long)]
    pub fasta: PathBuf,

    /// Read length
    #[arg(short = 'l', long, default_value_t = 50, value_parser = parse_positive)]
    pub read_length: usize,

    /// Derive paired-end read pairs instead of single-end reads
    #[arg(short, long)]
    pub paired_end: bool,

    /// Insert size of paired-end fragments (must not be below the read length)
    #[arg(short, long, default_value_t = 150, value_parser = parse_positive)]
    pub insert_size: usize,
}

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Transcript annotation in GTF format (plain or gzipped)
    #[arg(short, long)]
    pub gtf: PathBuf,

    /// Transcript sequences in FASTA format (plain or gzipped)
    #[arg(short, long)]
    pub fasta: PathBuf,

    /// Theoretical count table (CSV rows "gene,unique_read_count")
    #[arg(short, long)]
    pub counts: PathBuf,

    /// Mapped reads in SAM format (plain or gzipped)
    #[arg(short, long)]
    pub alignments: PathBuf,

    /// Read length the count table was produced with
    #[arg(short = 'l', long, default_value_t = 50, value_parser = parse_positive)]
    pub read_length: usize,
}

#[derive(Args, Debug)]
pub struct GeneLengthsArgs {
    /// Transcript annotation in GTF format (plain or gzipped)
    #[arg(short, long)]
    pub gtf: PathBuf,
}

fn parse_positive(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if value == 0 {
        return Err("value must be at least 1".to_string());
    }
    Ok(value)
}
