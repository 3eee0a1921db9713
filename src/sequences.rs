//! Transcript sequence input.
//!
//! Loads the transcript FASTA into an immutable identifier-to-sequence map.
//! Plain and gzip-compressed files are both accepted; compression is detected
//! from the stream's magic bytes rather than the file name. Sequences are
//! normalized to uppercase at load so windowing never produces spurious
//! case-only non-duplicates.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use bio::io::fasta;
use bytes::Bytes;
use flate2::bufread::MultiGzDecoder;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::error::TxReadsError;

/// Probes a buffered stream for the gzip magic number without consuming it.
pub(crate) fn is_gzipped<R: BufRead>(reader: &mut R) -> std::io::Result<bool> {
    const GZIP_MAGIC_NUMBER: [u8; 2] = [0x1f, 0x8b];

    let src = reader.fill_buf()?;
    Ok(src.get(..2) == Some(&GZIP_MAGIC_NUMBER))
}

/// Loads transcript sequences keyed by transcript identifier.
///
/// # Errors
///
/// Returns [`TxReadsError::SequenceRead`] if the file cannot be opened or
/// parsed, and [`TxReadsError::MalformedInput`] if a transcript identifier
/// occurs more than once.
pub fn load_transcript_sequences<P: AsRef<Path>>(
    path: P,
) -> Result<FxHashMap<String, Bytes>, TxReadsError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TxReadsError::SequenceRead {
        source,
        path: path.into(),
    })?;
    let mut inner = BufReader::new(file);
    let gzipped = is_gzipped(&mut inner).map_err(|source| TxReadsError::SequenceRead {
        source,
        path: path.into(),
    })?;

    let sequences = if gzipped {
        from_reader(MultiGzDecoder::new(inner), path)?
    } else {
        from_reader(inner, path)?
    };

    info!(
        "loaded {} transcript sequences from '{}'",
        sequences.len(),
        path.display()
    );
    Ok(sequences)
}

fn from_reader<R: Read>(reader: R, path: &Path) -> Result<FxHashMap<String, Bytes>, TxReadsError> {
    let mut sequences = FxHashMap::default();
    for result in fasta::Reader::new(reader).records() {
        let record = result.map_err(|source| TxReadsError::SequenceRead {
            source,
            path: path.into(),
        })?;
        let id = record.id().to_string();
        let seq = Bytes::from(record.seq().to_ascii_uppercase());
        if sequences.insert(id.clone(), seq).is_some() {
            return Err(TxReadsError::malformed(format!(
                "duplicate transcript '{id}' in sequence file '{}'",
                path.display()
            )));
        }
    }
    Ok(sequences)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_records_and_uppercases() {
        let fasta = b">T1 some description\nacgtacgt\n>T2\nACGTAC\n";
        let sequences = from_reader(&fasta[..], Path::new("test.fa")).unwrap();
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences["T1"], Bytes::from_static(b"ACGTACGT"));
        assert_eq!(sequences["T2"], Bytes::from_static(b"ACGTAC"));
    }

    #[test]
    fn multiline_sequences_are_joined() {
        let fasta = b">T1\nACGT\nACGT\n";
        let sequences = from_reader(&fasta[..], Path::new("test.fa")).unwrap();
        assert_eq!(sequences["T1"], Bytes::from_static(b"ACGTACGT"));
    }

    #[test]
    fn duplicate_transcript_is_rejected() {
        let fasta = b">T1\nACGT\n>T1\nTTTT\n";
        let err = from_reader(&fasta[..], Path::new("test.fa")).unwrap_err();
        assert!(matches!(err, TxReadsError::MalformedInput { .. }));
        assert!(err.to_string().contains("duplicate transcript 'T1'"));
    }

    #[test]
    fn gzip_magic_is_detected() {
        let mut gzipped: &[u8] = &[0x1f, 0x8b, 0x08, 0x00];
        let mut plain: &[u8] = b">T1\nACGT\n";
        assert!(is_gzipped(&mut gzipped).unwrap());
        assert!(!is_gzipped(&mut plain).unwrap());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_transcript_sequences("does/not/exist.fa").unwrap_err();
        assert!(matches!(err, TxReadsError::SequenceRead { .. }));
        assert!(err.to_string().contains("does/not/exist.fa"));
    }
}
