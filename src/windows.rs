use bio::alphabets::dna::revcomp;
use bytes::Bytes;

use crate::error::TxReadsError;

/// Sequencing mode, fixed once at configuration-parse time.
///
/// Windowing, aggregation, and output all dispatch on this enum instead of
/// threading a paired-end flag through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    SingleEnd {
        read_length: usize,
    },
    PairedEnd {
        read_length: usize,
        insert_size: usize,
    },
}

impl ReadMode {
    /// Validates and constructs a [`ReadMode`].
    ///
    /// # Errors
    ///
    /// Returns [`TxReadsError::InvalidConfiguration`] if `read_length` is zero,
    /// or if `paired_end` is set and `insert_size` is zero or smaller than
    /// `read_length`.
    pub fn new(
        read_length: usize,
        paired_end: bool,
        insert_size: usize,
    ) -> Result<Self, TxReadsError> {
        if read_length == 0 {
            return Err(TxReadsError::InvalidConfiguration {
                details: "read length must be positive".to_string(),
            });
        }
        if !paired_end {
            return Ok(Self::SingleEnd { read_length });
        }
        if insert_size == 0 {
            return Err(TxReadsError::InvalidConfiguration {
                details: "insert size must be positive".to_string(),
            });
        }
        if insert_size < read_length {
            return Err(TxReadsError::InvalidConfiguration {
                details: format!(
                    "insert size {insert_size} is smaller than read length {read_length}"
                ),
            });
        }
        Ok(Self::PairedEnd {
            read_length,
            insert_size,
        })
    }

    pub fn read_length(&self) -> usize {
        match self {
            Self::SingleEnd { read_length } | Self::PairedEnd { read_length, .. } => *read_length,
        }
    }
}

/// Reverse complement of a nucleotide sequence.
///
/// Watson-Crick pairs are swapped and the sequence reversed; unresolved bases
/// such as `N` map to themselves.
pub fn reverse_complement(seq: &[u8]) -> Bytes {
    Bytes::from(revcomp(seq))
}

/// Every contiguous window of length `read_length` over `seq`, in order.
///
/// A sequence shorter than `read_length` yields nothing; this is a defined
/// edge case, not an error. Windows are zero-copy slices of the backing
/// sequence buffer.
pub fn single_end_windows(seq: &Bytes, read_length: usize) -> impl Iterator<Item = Bytes> + '_ {
    let starts = (seq.len() + 1).saturating_sub(read_length);
    (0..starts).map(move |i| seq.slice(i..i + read_length))
}

/// Every `(left, right)` read pair derivable from fragments of `insert_size`
/// bases over `seq`, in fragment order.
///
/// The left read is the fragment prefix of `read_length` bases; the right read
/// is the reverse complement of the fragment's `read_length`-base tail, as the
/// instrument would report it off the opposite strand. A sequence shorter than
/// `insert_size`, or an insert smaller than the read length, yields nothing.
pub fn paired_end_windows(
    seq: &Bytes,
    read_length: usize,
    insert_size: usize,
) -> impl Iterator<Item = (Bytes, Bytes)> + '_ {
    let starts = if insert_size < read_length {
        0
    } else {
        (seq.len() + 1).saturating_sub(insert_size)
    };
    (0..starts).map(move |i| {
        let fragment = seq.slice(i..i + insert_size);
        let left = fragment.slice(0..read_length);
        let right = reverse_complement(&fragment[insert_size - read_length..]);
        (left, right)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rustc_hash::FxHashSet;

    fn seq(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    #[test]
    fn single_end_windows_of_acgtacgt() {
        let windows: FxHashSet<Bytes> = single_end_windows(&seq("ACGTACGT"), 4).collect();
        let expected: FxHashSet<Bytes> = ["ACGT", "CGTA", "GTAC", "TACG"]
            .iter()
            .map(|s| seq(s))
            .collect();
        // "ACGT" occurs at two positions but is one set member
        assert_eq!(windows, expected);
        assert_eq!(windows.len(), 4);
    }

    #[test]
    fn short_sequence_yields_no_windows() {
        assert_eq!(single_end_windows(&seq("ACG"), 4).count(), 0);
    }

    #[test]
    fn window_equal_to_sequence_length() {
        let windows: Vec<Bytes> = single_end_windows(&seq("ACGT"), 4).collect();
        assert_eq!(windows, vec![seq("ACGT")]);
    }

    #[test]
    fn reverse_complement_maps_n_to_itself() {
        assert_eq!(reverse_complement(b"ANT"), seq("ANT"));
        assert_eq!(reverse_complement(b"ACGTN"), seq("NACGT"));
    }

    #[test]
    fn paired_end_windows_of_acgtac() {
        // one fragment "ACGTAC": left is its 4-base prefix, right is the
        // reverse complement of its 4-base tail "GTAC"
        let pairs: Vec<(Bytes, Bytes)> = paired_end_windows(&seq("ACGTAC"), 4, 6).collect();
        assert_eq!(pairs, vec![(seq("ACGT"), seq("GTAC"))]);
    }

    #[test]
    fn paired_end_windows_of_acgtacgt() {
        let pairs: Vec<(Bytes, Bytes)> = paired_end_windows(&seq("ACGTACGT"), 4, 6).collect();
        assert_eq!(
            pairs,
            vec![
                (seq("ACGT"), seq("GTAC")),
                (seq("CGTA"), seq("CGTA")),
                (seq("GTAC"), seq("ACGT")),
            ]
        );
    }

    #[test]
    fn insert_longer_than_sequence_yields_no_pairs() {
        assert_eq!(paired_end_windows(&seq("ACGTA"), 4, 6).count(), 0);
    }

    #[test]
    fn insert_smaller_than_read_length_yields_no_pairs() {
        assert_eq!(paired_end_windows(&seq("ACGTACGT"), 6, 4).count(), 0);
    }

    #[test]
    fn mode_rejects_zero_read_length() {
        assert!(matches!(
            ReadMode::new(0, false, 150),
            Err(TxReadsError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn mode_rejects_insert_smaller_than_read_length() {
        let err = ReadMode::new(50, true, 10).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: insert size 10 is smaller than read length 50"
        );
    }

    #[test]
    fn mode_ignores_insert_size_when_single_end() {
        // single-end runs accept any insert size; it is never consulted
        let mode = ReadMode::new(50, false, 10).unwrap();
        assert_eq!(mode, ReadMode::SingleEnd { read_length: 50 });
        assert_eq!(mode.read_length(), 50);
    }

    proptest! {
        #[test]
        fn reverse_complement_is_involutive(s in "[ACGT]{0,200}") {
            let original = Bytes::from(s.into_bytes());
            let twice = reverse_complement(&reverse_complement(&original));
            prop_assert_eq!(twice, original);
        }

        #[test]
        fn window_set_cardinality_is_bounded(s in "[ACGTN]{1,100}", k in 1usize..20) {
            let sequence = Bytes::from(s.into_bytes());
            let windows: FxHashSet<Bytes> = single_end_windows(&sequence, k).collect();
            if sequence.len() < k {
                prop_assert!(windows.is_empty());
            } else {
                prop_assert!(!windows.is_empty());
                prop_assert!(windows.len() <= sequence.len() - k + 1);
            }
        }

        #[test]
        fn every_window_has_read_length(s in "[ACGTN]{1,100}", k in 1usize..20) {
            let sequence = Bytes::from(s.into_bytes());
            for w in single_end_windows(&sequence, k) {
                prop_assert_eq!(w.len(), k);
            }
        }

        #[test]
        fn paired_reads_have_read_length(s in "[ACGT]{1,60}", k in 1usize..8, extra in 0usize..8) {
            let sequence = Bytes::from(s.into_bytes());
            let n = k + extra;
            for (left, right) in paired_end_windows(&sequence, k, n) {
                prop_assert_eq!(left.len(), k);
                prop_assert_eq!(right.len(), k);
            }
        }
    }
}
