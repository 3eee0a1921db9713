//! Mapped-alignment input.
//!
//! Iterates the records of a SAM file (plain or gzip-compressed) and keeps,
//! for each mapped record, the reference transcript name and the read
//! sequence. Header lines, unmapped records, and records with unknown
//! reference or sequence fields are skipped; structurally broken lines abort
//! the run.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use bytes::Bytes;
use flate2::bufread::MultiGzDecoder;
use tracing::info;

use crate::error::TxReadsError;
use crate::sequences::is_gzipped;

const FLAG_UNMAPPED: u16 = 0x4;

/// One mapped read: the transcript it aligned to, and its sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedRead {
    pub transcript: String,
    pub sequence: Bytes,
}

/// Reads all mapped records from a SAM file.
pub fn read_alignments<P: AsRef<Path>>(path: P) -> Result<Vec<MappedRead>, TxReadsError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| TxReadsError::AlignmentRead {
        source,
        path: path.into(),
    })?;
    let mut inner = BufReader::new(file);
    let gzipped = is_gzipped(&mut inner).map_err(|source| TxReadsError::AlignmentRead {
        source,
        path: path.into(),
    })?;

    let reads = if gzipped {
        from_reader(BufReader::new(MultiGzDecoder::new(inner)), path)?
    } else {
        from_reader(inner, path)?
    };

    info!(
        "read {} mapped alignment records from '{}'",
        reads.len(),
        path.display()
    );
    Ok(reads)
}

fn from_reader<R: BufRead>(rdr: R, path: &Path) -> Result<Vec<MappedRead>, TxReadsError> {
    let mut reads = Vec::new();
    for (index, result) in rdr.lines().enumerate() {
        let line = result.map_err(|source| TxReadsError::AlignmentRead {
            source,
            path: path.into(),
        })?;
        if line.is_empty() || line.starts_with('@') {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 11 {
            return Err(TxReadsError::malformed(format!(
                "alignment record at line {} of '{}' has {} fields, expected at least 11",
                index + 1,
                path.display(),
                fields.len()
            )));
        }
        let flag: u16 = fields[1].parse().map_err(|_| {
            TxReadsError::malformed(format!(
                "alignment record at line {} of '{}' has a non-numeric flag field '{}'",
                index + 1,
                path.display(),
                fields[1]
            ))
        })?;
        if flag & FLAG_UNMAPPED != 0 {
            continue;
        }
        let transcript = fields[2];
        let sequence = fields[9];
        if transcript == "*" || sequence == "*" {
            continue;
        }
        reads.push(MappedRead {
            transcript: transcript.to_string(),
            sequence: Bytes::from(sequence.as_bytes().to_ascii_uppercase()),
        });
    }
    Ok(reads)
}
