//! Subcommand orchestration and output emission.
//!
//! Each subcommand loads its inputs, runs the pure transformations from the
//! core modules, and streams its output to stdout through a `BufWriter`. The
//! emission functions are generic over `io::Write` so they can be exercised
//! against in-memory buffers.

use std::io::{stdout, BufWriter, Write};
use std::path::Path;

use bytes::Bytes;
use rustc_hash::FxHashMap;
use tracing::info;

use crate::aggregate::{aggregate_genes, GeneReads};
use crate::alignment::read_alignments;
use crate::annotation::Annotation;
use crate::cli::{Command, MatchArgs, WindowArgs};
use crate::error::TxReadsError;
use crate::lengths::{gene_lengths, GeneLength};
use crate::matcher::{match_mapped_reads, MappedReadCount, TheoreticalCounts};
use crate::sequences::load_transcript_sequences;
use crate::windows::ReadMode;

/// Runs one subcommand to completion, writing its output to stdout.
pub fn run(command: Command) -> Result<(), TxReadsError> {
    let mut out = BufWriter::new(stdout());
    match command {
        Command::Reads(args) => {
            let aggregated = window_genes(&args)?;
            write_reads(&mut out, &aggregated)?;
        }
        Command::Count(args) => {
            let aggregated = window_genes(&args)?;
            write_counts(&mut out, &aggregated)?;
        }
        Command::Match(args) => {
            let rows = match_alignments(&args)?;
            write_match(&mut out, &rows)?;
        }
        Command::GeneLengths(args) => {
            let annotation = Annotation::from_path(&args.gtf)?;
            let lengths = gene_lengths(&annotation)?;
            write_gene_lengths(&mut out, &lengths)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn window_genes(args: &WindowArgs) -> Result<Vec<(String, GeneReads)>, TxReadsError> {
    let mode = ReadMode::new(args.read_length, args.paired_end, args.insert_size)?;
    let (_, genes) = load_gene_sequences(&args.gtf, &args.fasta)?;
    let aggregated = aggregate_genes(&genes, mode);
    info!("windowed reads for {} genes", aggregated.len());
    Ok(aggregated)
}

fn match_alignments(args: &MatchArgs) -> Result<Vec<MappedReadCount>, TxReadsError> {
    let (annotation, genes) = load_gene_sequences(&args.gtf, &args.fasta)?;
    let aggregated = aggregate_genes(
        &genes,
        ReadMode::SingleEnd {
            read_length: args.read_length,
        },
    );
    let counts = TheoreticalCounts::from_path(&args.counts)?;
    let alignments = read_alignments(&args.alignments)?;
    match_mapped_reads(&counts, &aggregated, &annotation, &alignments)
}

fn load_gene_sequences(
    gtf: &Path,
    fasta: &Path,
) -> Result<(Annotation, Vec<(String, Vec<Bytes>)>), TxReadsError> {
    let annotation = Annotation::from_path(gtf)?;
    let sequences = load_transcript_sequences(fasta)?;
    let genes = gene_sequences(&annotation, &sequences)?;
    Ok((annotation, genes))
}

/// Joins the annotation and the sequence map into per-gene sequence lists,
/// in annotation gene order.
///
/// Membership is enforced both ways: every sequence record must belong to an
/// annotated transcript, and every annotated transcript must have a sequence.
fn gene_sequences(
    annotation: &Annotation,
    sequences: &FxHashMap<String, Bytes>,
) -> Result<Vec<(String, Vec<Bytes>)>, TxReadsError> {
    for transcript in sequences.keys() {
        if !annotation.contains_transcript(transcript) {
            return Err(TxReadsError::malformed(format!(
                "sequence file transcript '{transcript}' is absent from the annotation"
            )));
        }
    }

    let mut genes = Vec::with_capacity(annotation.num_genes());
    for gene in annotation.genes() {
        let transcripts = annotation.transcripts_of(gene).unwrap_or(&[]);
        let mut gene_seqs = Vec::with_capacity(transcripts.len());
        for transcript in transcripts {
            let seq = sequences.get(transcript).ok_or_else(|| {
                TxReadsError::malformed(format!(
                    "annotated transcript '{transcript}' has no sequence record"
                ))
            })?;
            gene_seqs.push(seq.clone());
        }
        genes.push((gene.to_string(), gene_seqs));
    }
    Ok(genes)
}

/// Writes each gene's unique reads as a FASTA-like stream, paired-end pairs
/// interleaved left then right.
fn write_reads<W: Write>(out: &mut W, genes: &[(String, GeneReads)]) -> Result<(), TxReadsError> {
    for (gene, reads) in genes {
        match reads {
            GeneReads::Single(set) => {
                for (i, read) in set.iter().enumerate() {
                    writeln!(out, ">{}_{}", gene, i + 1)?;
                    out.write_all(read)?;
                    out.write_all(b"\n")?;
                }
            }
            GeneReads::Paired(set) => {
                for (i, (left, right)) in set.iter().enumerate() {
                    writeln!(out, ">{}_{}/1", gene, i + 1)?;
                    out.write_all(left)?;
                    out.write_all(b"\n")?;
                    writeln!(out, ">{}_{}/2", gene, i + 1)?;
                    out.write_all(right)?;
                    out.write_all(b"\n")?;
                }
            }
        }
    }
    Ok(())
}

fn write_counts<W: Write>(out: &mut W, genes: &[(String, GeneReads)]) -> Result<(), TxReadsError> {
    writeln!(out, "gene,unique_read_count")?;
    for (gene, reads) in genes {
        writeln!(out, "{},{}", gene, reads.count())?;
    }
    Ok(())
}

fn write_match<W: Write>(out: &mut W, rows: &[MappedReadCount]) -> Result<(), TxReadsError> {
    writeln!(
        out,
        "gene,unique_read_count,mapped_read_count,mapped_read_fraction"
    )?;
    for row in rows {
        writeln!(
            out,
            "{},{},{},{}",
            row.gene, row.unique_reads, row.mapped_reads, row.mapped_fraction
        )?;
    }
    Ok(())
}

fn write_gene_lengths<W: Write>(out: &mut W, lengths: &[GeneLength]) -> Result<(), TxReadsError> {
    writeln!(out, "gene,gene_length,max_transcript_length")?;
    for length in lengths {
        writeln!(
            out,
            "{},{},{}",
            length.gene, length.gene_length, length.max_transcript_length
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use noodles::gtf;

    fn seq(s: &str) -> Bytes {
        Bytes::copy_from_slice(s.as_bytes())
    }

    fn annotation(gtf_bytes: &[u8]) -> Annotation {
        let mut rdr = gtf::Reader::new(gtf_bytes);
        Annotation::from_gtf_reader(&mut rdr, Path::new("test.gtf")).unwrap()
    }

    const GTF: &[u8] = b"chr1\thavana\texon\t1\t8\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";\n\
chr1\thavana\texon\t1\t6\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T2\";\n";

    #[test]
    fn gene_sequences_joins_in_annotation_order() {
        let mut sequences = FxHashMap::default();
        sequences.insert("T1".to_string(), seq("ACGTACGT"));
        sequences.insert("T2".to_string(), seq("ACGTAC"));
        let genes = gene_sequences(&annotation(GTF), &sequences).unwrap();
        assert_eq!(genes.len(), 1);
        assert_eq!(genes[0].0, "G1");
        assert_eq!(genes[0].1, vec![seq("ACGTACGT"), seq("ACGTAC")]);
    }

    #[test]
    fn unannotated_sequence_record_is_rejected() {
        let mut sequences = FxHashMap::default();
        sequences.insert("T1".to_string(), seq("ACGTACGT"));
        sequences.insert("T2".to_string(), seq("ACGTAC"));
        sequences.insert("T9".to_string(), seq("ACGT"));
        let err = gene_sequences(&annotation(GTF), &sequences).unwrap_err();
        assert!(err.to_string().contains("'T9' is absent from the annotation"));
    }

    #[test]
    fn annotated_transcript_without_sequence_is_rejected() {
        let mut sequences = FxHashMap::default();
        sequences.insert("T1".to_string(), seq("ACGTACGT"));
        let err = gene_sequences(&annotation(GTF), &sequences).unwrap_err();
        assert!(err.to_string().contains("'T2' has no sequence record"));
    }

    #[test]
    fn write_reads_single_end() {
        let genes = vec![("G1".to_string(), vec![seq("ACGTA")])];
        let aggregated = aggregate_genes(&genes, ReadMode::SingleEnd { read_length: 4 });
        let mut out = Vec::new();
        write_reads(&mut out, &aggregated).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            ">G1_1\nACGT\n>G1_2\nCGTA\n"
        );
    }

    #[test]
    fn write_reads_interleaves_pairs() {
        let genes = vec![("G1".to_string(), vec![seq("ACGTAC")])];
        let aggregated = aggregate_genes(
            &genes,
            ReadMode::PairedEnd {
                read_length: 4,
                insert_size: 6,
            },
        );
        let mut out = Vec::new();
        write_reads(&mut out, &aggregated).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            ">G1_1/1\nACGT\n>G1_1/2\nGTAC\n"
        );
    }

    #[test]
    fn write_counts_includes_header_and_order() {
        let genes = vec![
            ("G1".to_string(), vec![seq("ACGTACGT")]),
            ("G2".to_string(), vec![seq("AC")]),
        ];
        let aggregated = aggregate_genes(&genes, ReadMode::SingleEnd { read_length: 4 });
        let mut out = Vec::new();
        write_counts(&mut out, &aggregated).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "gene,unique_read_count\nG1,4\nG2,0\n"
        );
    }

    #[test]
    fn write_match_formats_fraction() {
        let rows = vec![
            MappedReadCount {
                gene: "G1".to_string(),
                unique_reads: 4,
                mapped_reads: 2,
                mapped_fraction: 0.5,
            },
            MappedReadCount {
                gene: "G2".to_string(),
                unique_reads: 0,
                mapped_reads: 0,
                mapped_fraction: 0.0,
            },
        ];
        let mut out = Vec::new();
        write_match(&mut out, &rows).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "gene,unique_read_count,mapped_read_count,mapped_read_fraction\nG1,4,2,0.5\nG2,0,0,0\n"
        );
    }

    #[test]
    fn write_gene_lengths_formats_rows() {
        let lengths = vec![GeneLength {
            gene: "G1".to_string(),
            gene_length: 16,
            max_transcript_length: 8,
        }];
        let mut out = Vec::new();
        write_gene_lengths(&mut out, &lengths).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "gene,gene_length,max_transcript_length\nG1,16,8\n"
        );
    }
}
