//! Cross-referencing mapped reads against the theoretical read table.
//!
//! Mapped reads are deduplicated by sequence content per gene before
//! counting; only sequences that exactly match one of the gene's theoretical
//! windows at the declared read length contribute. The theoretical count
//! table supplies the denominator for the mapped fraction.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bytes::Bytes;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::info;

use crate::aggregate::{GeneReads, ReadSet};
use crate::alignment::MappedRead;
use crate::annotation::Annotation;
use crate::error::TxReadsError;

/// Immutable gene-to-theoretical-unique-read-count table.
///
/// Row order follows the input file; lookups are by gene identifier.
#[derive(Debug, Default)]
pub struct TheoreticalCounts {
    rows: Vec<(String, u64)>,
    index: FxHashMap<String, u64>,
}

impl TheoreticalCounts {
    /// Reads `gene,unique_read_count` rows from a CSV file.
    ///
    /// A header row is tolerated as the first line only.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TxReadsError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TxReadsError::CountTableRead {
            source,
            path: path.into(),
        })?;
        let counts = Self::from_reader(BufReader::new(file), path)?;
        info!(
            "read theoretical counts for {} genes from '{}'",
            counts.rows.len(),
            path.display()
        );
        Ok(counts)
    }

    fn from_reader<R: BufRead>(rdr: R, path: &Path) -> Result<Self, TxReadsError> {
        let mut counts = Self::default();
        for (index, result) in rdr.lines().enumerate() {
            let line = result.map_err(|source| TxReadsError::CountTableRead {
                source,
                path: path.into(),
            })?;
            if line.is_empty() {
                continue;
            }
            let Some((gene, count)) = line.split_once(',') else {
                return Err(TxReadsError::malformed(format!(
                    "count table row at line {} of '{}' is not 'gene,count'",
                    index + 1,
                    path.display()
                )));
            };
            let count: u64 = match count.trim().parse() {
                Ok(count) => count,
                // a non-numeric count field is only acceptable as a header
                Err(_) if index == 0 => continue,
                Err(_) => {
                    return Err(TxReadsError::malformed(format!(
                        "count table row at line {} of '{}' has a non-numeric count '{}'",
                        index + 1,
                        path.display(),
                        count.trim()
                    )));
                }
            };
            let gene = gene.trim().to_string();
            if counts.index.insert(gene.clone(), count).is_some() {
                return Err(TxReadsError::malformed(format!(
                    "gene '{gene}' occurs more than once in count table '{}'",
                    path.display()
                )));
            }
            counts.rows.push((gene, count));
        }
        Ok(counts)
    }

    pub fn get(&self, gene: &str) -> Option<u64> {
        self.index.get(gene).copied()
    }

    /// Rows in input order.
    pub fn rows(&self) -> &[(String, u64)] {
        &self.rows
    }
}

/// Per-gene comparison of theoretical and mapped unique reads.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedReadCount {
    pub gene: String,
    pub unique_reads: u64,
    pub mapped_reads: u64,
    pub mapped_fraction: f64,
}

/// Counts, per gene, the distinct mapped read sequences that occur in that
/// gene's theoretical window set.
///
/// # Errors
///
/// [`TxReadsError::UnknownGene`] when an alignment resolves to a gene absent
/// from the count table; [`TxReadsError::MalformedInput`] when an alignment
/// references a transcript absent from the annotation, or the count table
/// names a gene absent from the annotation.
pub fn match_mapped_reads(
    counts: &TheoreticalCounts,
    gene_reads: &[(String, GeneReads)],
    annotation: &Annotation,
    alignments: &[MappedRead],
) -> Result<Vec<MappedReadCount>, TxReadsError> {
    for (gene, _) in counts.rows() {
        if !annotation.contains_gene(gene) {
            return Err(TxReadsError::malformed(format!(
                "count table names gene '{gene}' absent from the annotation"
            )));
        }
    }

    let windows: FxHashMap<&str, &ReadSet<Bytes>> = gene_reads
        .iter()
        .filter_map(|(gene, reads)| reads.single().map(|set| (gene.as_str(), set)))
        .collect();

    let mut mapped: FxHashMap<&str, FxHashSet<Bytes>> = FxHashMap::default();
    for record in alignments {
        let gene = annotation.gene_of(&record.transcript)?;
        if counts.get(gene).is_none() {
            return Err(TxReadsError::UnknownGene {
                gene: gene.to_string(),
            });
        }
        // reads that match no theoretical window contribute nothing
        if let Some(set) = windows.get(gene) {
            if set.contains(&record.sequence) {
                mapped.entry(gene).or_default().insert(record.sequence.clone());
            }
        }
    }

    let rows = counts
        .rows()
        .iter()
        .map(|(gene, unique_reads)| {
            let mapped_reads = mapped.get(gene.as_str()).map_or(0, |set| set.len() as u64);
            let mapped_fraction = if *unique_reads == 0 {
                0.0
            } else {
                mapped_reads as f64 / *unique_reads as f64
            };
            MappedReadCount {
                gene: gene.clone(),
                unique_reads: *unique_reads,
                mapped_reads,
                mapped_fraction,
            }
        })
        .collect();
    Ok(rows)
}
