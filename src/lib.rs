//! Theoretical RNA-seq read enumeration over annotated transcripts.
//!
//! txreads answers a sequencing-depth sanity-check question: for a chosen
//! read length (and optionally a paired-end insert size), which distinct
//! reads *could* an instrument produce from each gene's transcripts, how
//! many are there, and how many of them actually show up in an alignment
//! file?
//!
//! The pipeline is three independent batch transformations:
//!
//! - [`windows`] slides fixed-length windows (or fragment-derived read
//!   pairs) over a transcript sequence;
//! - [`aggregate`] unions the windows of all transcripts of a gene into one
//!   deduplicated, insertion-ordered read set per gene;
//! - [`matcher`] cross-references a per-gene theoretical count table against
//!   distinct mapped read sequences from an alignment file.
//!
//! [`annotation`], [`sequences`], and [`alignment`] load the GTF, FASTA, and
//! SAM inputs into the immutable lookup structures the transformations
//! consume; [`lengths`] derives per-gene length summaries from the
//! annotation alone.

pub mod aggregate;
pub mod alignment;
pub mod annotation;
pub mod cli;
pub mod error;
pub mod lengths;
pub mod matcher;
pub mod run;
pub mod sequences;
pub mod windows;

pub use aggregate::{aggregate_genes, gene_read_set, GeneReads, ReadSet};
pub use error::TxReadsError;
pub use windows::{paired_end_windows, reverse_complement, single_end_windows, ReadMode};
