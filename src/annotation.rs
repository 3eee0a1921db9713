//! Gene annotation input.
//!
//! Parses a GTF file into an immutable [`Annotation`]: which transcripts
//! belong to which gene, the order genes first appear in the file, and the
//! exon intervals of every transcript. Only `exon` records carry the
//! information this crate needs; all other feature types are skipped.

use std::collections::hash_map::Entry;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::bufread::MultiGzDecoder;
use noodles::gtf;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::error::TxReadsError;
use crate::sequences::is_gzipped;

/// One-based inclusive exon coordinates, as given in the GTF.
pub type ExonInterval = (usize, usize);

/// Immutable transcript/gene lookup structures built once at load time.
#[derive(Debug, Default)]
pub struct Annotation {
    gene_order: Vec<String>,
    gene_transcripts: FxHashMap<String, Vec<String>>,
    transcript_gene: FxHashMap<String, String>,
    transcript_exons: FxHashMap<String, Vec<ExonInterval>>,
}

impl Annotation {
    /// Reads the annotation from a plain or gzip-compressed GTF file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TxReadsError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TxReadsError::AnnotationRead {
            source,
            path: path.into(),
        })?;
        let mut inner = BufReader::new(file);
        let gzipped = is_gzipped(&mut inner).map_err(|source| TxReadsError::AnnotationRead {
            source,
            path: path.into(),
        })?;

        if gzipped {
            let mut rdr = gtf::Reader::new(BufReader::new(MultiGzDecoder::new(inner)));
            Self::from_gtf_reader(&mut rdr, path)
        } else {
            let mut rdr = gtf::Reader::new(inner);
            Self::from_gtf_reader(&mut rdr, path)
        }
    }

    /// Reads the annotation from an open GTF reader.
    pub fn from_gtf_reader<R: BufRead>(
        rdr: &mut gtf::Reader<R>,
        path: &Path,
    ) -> Result<Self, TxReadsError> {
        let mut annotation = Self::default();
        let mut n_exons = 0usize;

        for l in rdr.lines() {
            let line = l.map_err(|source| TxReadsError::AnnotationRead {
                source,
                path: path.into(),
            })?;
            let gtf::Line::Record(record) = line else {
                continue;
            };
            if record.ty() != "exon" {
                continue;
            }
            n_exons += 1;

            let mut gene_id = None;
            let mut transcript_id = None;
            for attr in record.attributes().iter() {
                match attr.key() {
                    "gene_id" => gene_id = Some(attr.value().to_string()),
                    "transcript_id" => transcript_id = Some(attr.value().to_string()),
                    _ => {}
                }
            }
            let gene_id = gene_id.ok_or_else(|| {
                TxReadsError::malformed(format!(
                    "exon record without a gene_id attribute in '{}'",
                    path.display()
                ))
            })?;
            let transcript_id = transcript_id.ok_or_else(|| {
                TxReadsError::malformed(format!(
                    "exon record without a transcript_id attribute in '{}'",
                    path.display()
                ))
            })?;

            annotation.add_exon(
                gene_id,
                transcript_id,
                record.start().get(),
                record.end().get(),
            )?;
        }

        info!(
            "read {} exon records for {} genes ({} transcripts) from '{}'",
            n_exons,
            annotation.num_genes(),
            annotation.num_transcripts(),
            path.display()
        );
        Ok(annotation)
    }

    fn add_exon(
        &mut self,
        gene: String,
        transcript: String,
        start: usize,
        end: usize,
    ) -> Result<(), TxReadsError> {
        if end < start {
            return Err(TxReadsError::malformed(format!(
                "exon of transcript '{transcript}' has end {end} before start {start}"
            )));
        }
        match self.transcript_gene.get(&transcript) {
            Some(existing) if *existing != gene => {
                return Err(TxReadsError::malformed(format!(
                    "transcript '{transcript}' is assigned to genes '{existing}' and '{gene}'"
                )));
            }
            Some(_) => {}
            None => {
                self.transcript_gene.insert(transcript.clone(), gene.clone());
                let transcripts = match self.gene_transcripts.entry(gene.clone()) {
                    Entry::Occupied(entry) => entry.into_mut(),
                    Entry::Vacant(entry) => {
                        self.gene_order.push(gene);
                        entry.insert(Vec::new())
                    }
                };
                transcripts.push(transcript.clone());
            }
        }
        self.transcript_exons
            .entry(transcript)
            .or_default()
            .push((start, end));
        Ok(())
    }

    /// Gene identifiers in the order they first appear in the GTF.
    pub fn genes(&self) -> impl Iterator<Item = &str> {
        self.gene_order.iter().map(String::as_str)
    }

    pub fn num_genes(&self) -> usize {
        self.gene_order.len()
    }

    pub fn num_transcripts(&self) -> usize {
        self.transcript_gene.len()
    }

    /// Transcripts of `gene`, in GTF order.
    pub fn transcripts_of(&self, gene: &str) -> Option<&[String]> {
        self.gene_transcripts.get(gene).map(Vec::as_slice)
    }

    /// Resolves the owning gene of `transcript`.
    ///
    /// # Errors
    ///
    /// Returns [`TxReadsError::MalformedInput`] when the transcript is absent
    /// from the annotation.
    pub fn gene_of(&self, transcript: &str) -> Result<&str, TxReadsError> {
        self.transcript_gene
            .get(transcript)
            .map(String::as_str)
            .ok_or_else(|| {
                TxReadsError::malformed(format!(
                    "transcript '{transcript}' is absent from the annotation"
                ))
            })
    }

    pub fn contains_transcript(&self, transcript: &str) -> bool {
        self.transcript_gene.contains_key(transcript)
    }

    pub fn contains_gene(&self, gene: &str) -> bool {
        self.gene_transcripts.contains_key(gene)
    }

    /// Exon intervals of `transcript`, in GTF order.
    pub fn transcript_exons(&self, transcript: &str) -> Option<&[ExonInterval]> {
        self.transcript_exons.get(transcript).map(Vec::as_slice)
    }
}
