//! Error types for txreads.
//!
//! Every failure in the pipeline is fatal: inputs are loaded once, transformed,
//! and written out, so there is nothing to retry. The variants here give each
//! failure class from configuration, input parsing, and matching a typed,
//! precise message.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in txreads operations.
#[derive(Debug, Error)]
pub enum TxReadsError {
    /// Rejected configuration, detected before any windowing begins.
    #[error("invalid configuration: {details}")]
    InvalidConfiguration { details: String },

    /// An input record contradicts the annotation, or cannot be parsed.
    #[error("malformed input: {details}")]
    MalformedInput { details: String },

    /// An alignment record names a gene absent from the theoretical count table.
    #[error("gene '{gene}' is not present in the theoretical count table")]
    UnknownGene { gene: String },

    /// Failed to read the annotation (GTF) file.
    #[error("failed to read annotation file '{path}': {source}")]
    AnnotationRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to read the transcript sequence (FASTA) file.
    #[error("failed to read sequence file '{path}': {source}")]
    SequenceRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to read the alignment (SAM) file.
    #[error("failed to read alignment file '{path}': {source}")]
    AlignmentRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to read the theoretical count table.
    #[error("failed to read count table '{path}': {source}")]
    CountTableRead {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Failed to write output.
    #[error("failed to write output: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },
}

impl TxReadsError {
    /// Shorthand for a [`TxReadsError::MalformedInput`] with a formatted message.
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::MalformedInput {
            details: details.into(),
        }
    }
}

impl From<std::io::Error> for TxReadsError {
    fn from(source: std::io::Error) -> Self {
        Self::WriteError { source }
    }
}
