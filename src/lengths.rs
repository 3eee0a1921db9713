//! Per-gene length summaries derived from exon annotation.
//!
//! `gene_length` counts the bases in the union of all exons of the gene,
//! including 3' and 5' UTRs; `max_transcript_length` is the largest
//! per-transcript sum of exon lengths.

use tracing::info;

use crate::annotation::{Annotation, ExonInterval};
use crate::error::TxReadsError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneLength {
    pub gene: String,
    pub gene_length: u64,
    pub max_transcript_length: u64,
}

/// Computes gene and maximum transcript lengths for every gene, sorted by
/// gene identifier.
///
/// # Errors
///
/// Returns [`TxReadsError::MalformedInput`] when a gene's maximum transcript
/// length exceeds its gene length, which can only happen when a transcript
/// lists self-overlapping exons.
pub fn gene_lengths(annotation: &Annotation) -> Result<Vec<GeneLength>, TxReadsError> {
    let mut genes: Vec<&str> = annotation.genes().collect();
    genes.sort_unstable();

    let mut lengths = Vec::with_capacity(genes.len());
    for gene in genes {
        let transcripts = annotation.transcripts_of(gene).unwrap_or(&[]);

        let mut exons: Vec<ExonInterval> = Vec::new();
        let mut max_transcript_length = 0u64;
        for transcript in transcripts {
            let transcript_exons = annotation.transcript_exons(transcript).unwrap_or(&[]);
            let transcript_length: u64 = transcript_exons
                .iter()
                .map(|&(start, end)| (end - start + 1) as u64)
                .sum();
            max_transcript_length = max_transcript_length.max(transcript_length);
            exons.extend_from_slice(transcript_exons);
        }

        let gene_length = union_length(exons);
        if max_transcript_length > gene_length {
            return Err(TxReadsError::malformed(format!(
                "gene '{gene}': max transcript length ({max_transcript_length}) \
                 exceeds gene length ({gene_length})"
            )));
        }
        lengths.push(GeneLength {
            gene: gene.to_string(),
            gene_length,
            max_transcript_length,
        });
    }

    info!("calculated lengths for {} genes", lengths.len());
    Ok(lengths)
}

/// Number of bases covered by the union of one-based inclusive intervals.
fn union_length(mut exons: Vec<ExonInterval>) -> u64 {
    if exons.is_empty() {
        return 0;
    }
    exons.sort_unstable();

    let mut total = 0u64;
    let (mut start, mut end) = exons[0];
    for &(next_start, next_end) in &exons[1..] {
        // adjacent inclusive intervals cover a contiguous run of bases
        if next_start <= end + 1 {
            end = end.max(next_end);
        } else {
            total += (end - start + 1) as u64;
            (start, end) = (next_start, next_end);
        }
    }
    total + (end - start + 1) as u64
}
