//! Per-gene read aggregation.
//!
//! Applies the configured windower to every transcript of a gene and unions
//! the results into one deduplicated, insertion-ordered read set per gene.
//! Genes are independent, so aggregation fans out across genes with `rayon`
//! while the collected output preserves annotation order.

use std::hash::Hash;

use bytes::Bytes;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::windows::{paired_end_windows, single_end_windows, ReadMode};

/// A deduplicated set that remembers insertion order.
///
/// Membership is by content (value equality), so a read seen in two
/// transcripts of the same gene is recorded once, at its first position.
#[derive(Debug, Default, Clone)]
pub struct ReadSet<T> {
    seen: FxHashSet<T>,
    order: Vec<T>,
}

impl<T: Eq + Hash + Clone> ReadSet<T> {
    pub fn insert(&mut self, read: T) -> bool {
        if self.seen.insert(read.clone()) {
            self.order.push(read);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, read: &T) -> bool {
        self.seen.contains(read)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Reads in the order they were first inserted.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.order.iter()
    }
}

/// The unique theoretical reads of one gene.
#[derive(Debug, Clone)]
pub enum GeneReads {
    Single(ReadSet<Bytes>),
    Paired(ReadSet<(Bytes, Bytes)>),
}

impl GeneReads {
    /// Number of unique reads (single-end) or read pairs (paired-end).
    pub fn count(&self) -> usize {
        match self {
            Self::Single(set) => set.len(),
            Self::Paired(set) => set.len(),
        }
    }

    /// The single-end read set, if this gene was windowed single-end.
    pub fn single(&self) -> Option<&ReadSet<Bytes>> {
        match self {
            Self::Single(set) => Some(set),
            Self::Paired(_) => None,
        }
    }
}

/// Windows every transcript sequence of one gene and unions the results.
///
/// A gene with no transcript long enough to yield a read produces an empty
/// set, reported downstream as count 0.
pub fn gene_read_set(sequences: &[Bytes], mode: ReadMode) -> GeneReads {
    match mode {
        ReadMode::SingleEnd { read_length } => {
            let mut set = ReadSet::default();
            for seq in sequences {
                for window in single_end_windows(seq, read_length) {
                    set.insert(window);
                }
            }
            GeneReads::Single(set)
        }
        ReadMode::PairedEnd {
            read_length,
            insert_size,
        } => {
            let mut set = ReadSet::default();
            for seq in sequences {
                for pair in paired_end_windows(seq, read_length, insert_size) {
                    set.insert(pair);
                }
            }
            GeneReads::Paired(set)
        }
    }
}

/// Aggregates read sets for every gene, in parallel, preserving input order.
///
/// Deduplication is gene-scoped: the same read sequence occurring in
/// transcripts of two different genes is counted independently for each.
pub fn aggregate_genes(
    genes: &[(String, Vec<Bytes>)],
    mode: ReadMode,
) -> Vec<(String, GeneReads)> {
    genes
        .par_iter()
        .map(|(gene, sequences)| (gene.clone(), gene_read_set(sequences, mode)))
        .collect()
}
