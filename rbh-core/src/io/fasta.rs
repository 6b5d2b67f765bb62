//! Protein FASTA handling for the search corpus
//!
//! Per-genome gene files are concatenated byte-for-byte into a single corpus
//! for DIAMOND. Headers are scanned separately with needletail to remember
//! which genome every gene came from, since the hit table only carries gene IDs.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use needletail::parse_fastx_file;
use rayon::prelude::*;
use thiserror::Error;

use crate::types::{GeneId, GeneIndex, GenomeId};

#[derive(Debug, Error)]
pub enum FastaError {
    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Invalid gene index line {line}: {content}")]
    InvalidIndexLine { line: usize, content: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn open_maybe_gzipped(path: &Path) -> Result<Box<dyn Read>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    if path.to_string_lossy().ends_with(".gz") {
        Ok(Box::new(GzDecoder::new(file)))
    } else {
        Ok(Box::new(file))
    }
}

/// Concatenate `inputs` into `output` in order.
///
/// Gzipped inputs are decompressed on the way through. A newline is inserted
/// after any file that does not end with one so records never run together.
/// Returns the number of bytes written.
pub fn concatenate_files<P: AsRef<Path>>(inputs: &[P], output: &Path) -> Result<u64> {
    let out = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut writer = BufWriter::new(out);
    let mut buffer = vec![0u8; 64 * 1024];
    let mut written = 0u64;

    for input in inputs {
        let input = input.as_ref();
        let mut reader = open_maybe_gzipped(input)?;
        let mut last_byte = None;

        loop {
            let n = reader
                .read(&mut buffer)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            if n == 0 {
                break;
            }
            writer.write_all(&buffer[..n])?;
            last_byte = Some(buffer[n - 1]);
            written += n as u64;
        }

        if matches!(last_byte, Some(b) if b != b'\n') {
            writer.write_all(b"\n")?;
            written += 1;
        }
        log::debug!("Appended {} to {}", input.display(), output.display());
    }

    writer.flush()?;
    Ok(written)
}

/// Genome identifier for a gene file: its file name with the final extension removed.
/// A trailing `.gz` is stripped first so `GCF_1.faa.gz` and `GCF_1.faa` agree.
pub fn genome_id<P: AsRef<Path>>(path: P) -> GenomeId {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    match name.rfind('.') {
        Some(pos) if pos > 0 => name[..pos].to_string(),
        _ => name.to_string(),
    }
}

/// Read the sequence IDs of a FASTA file. The ID is the header up to the first whitespace,
/// which is what DIAMOND reports as `qseqid`/`sseqid`.
///
/// An empty file is a genome without predicted genes and yields no IDs.
pub fn scan_gene_ids<P: AsRef<Path>>(path: P) -> Result<Vec<GeneId>> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    if metadata.len() == 0 {
        log::warn!("{} contains no genes", path.display());
        return Ok(Vec::new());
    }

    let mut reader = parse_fastx_file(path).map_err(|e| FastaError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut ids = Vec::new();
    while let Some(record) = reader.next() {
        let record = record.map_err(|e| FastaError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let header = String::from_utf8_lossy(record.id());
        let id = header.split_whitespace().next().unwrap_or_default();
        ids.push(id.to_string());
    }

    Ok(ids)
}

impl GeneIndex {
    /// Build the gene-to-genome map for a set of per-genome gene files.
    /// Files are scanned in parallel; insertion follows input order so the first genome
    /// listed keeps any duplicated ID.
    pub fn from_files<P: AsRef<Path> + Sync>(inputs: &[P]) -> Result<Self> {
        let scanned: Vec<(GenomeId, Vec<GeneId>)> = inputs
            .par_iter()
            .map(|p| -> Result<(GenomeId, Vec<GeneId>)> { Ok((genome_id(p), scan_gene_ids(p)?)) })
            .collect::<Result<_>>()?;

        let mut index = GeneIndex::new();
        let mut duplicates = 0usize;
        for (genome, genes) in scanned {
            index.add_genome(&genome);
            for gene in genes {
                if !index.insert(gene, &genome) {
                    duplicates += 1;
                }
            }
        }

        if duplicates > 0 {
            log::warn!(
                "{} gene IDs occur in more than one input file; hits for them are attributed to the first genome",
                duplicates
            );
        }
        log::info!(
            "Indexed {} genes across {} genomes",
            index.num_genes(),
            index.num_genomes()
        );
        Ok(index)
    }

    /// Write the index as `gene<TAB>genome` lines, sorted by gene.
    pub fn write_tsv(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create gene index {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        for (gene, genome) in self.sorted_entries() {
            writeln!(writer, "{}\t{}", gene, genome)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Read an index written by [`GeneIndex::write_tsv`].
    pub fn read_tsv(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open gene index {}", path.display()))?;
        let reader = BufReader::new(file);
        let mut index = GeneIndex::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            match (fields.next(), fields.next()) {
                (Some(gene), Some(genome)) if !gene.is_empty() && !genome.is_empty() => {
                    index.insert(gene.to_string(), genome.trim_end());
                }
                _ => {
                    return Err(FastaError::InvalidIndexLine {
                        line: line_num + 1,
                        content: line.clone(),
                    }
                    .into())
                }
            }
        }

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_genome_id() {
        assert_eq!(genome_id("data/GCF_000005845.2.faa"), "GCF_000005845.2");
        assert_eq!(genome_id("/tmp/genome_a.faa.gz"), "genome_a");
        assert_eq!(genome_id("plain"), "plain");
        assert_eq!(genome_id(".hidden"), ".hidden");
    }

    #[test]
    fn test_concatenate_inserts_missing_newline() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.faa", ">a1\nMKV\n>a2\nMLL");
        let b = write_file(&dir, "b.faa", ">b1\nMST\n");
        let out = dir.path().join("all.faa");

        let written = concatenate_files(&[a, b], &out).unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(content, ">a1\nMKV\n>a2\nMLL\n>b1\nMST\n");
        assert_eq!(written, content.len() as u64);
    }

    #[test]
    fn test_concatenate_decompresses_gzip() {
        let dir = TempDir::new().unwrap();
        let gz_path = dir.path().join("c.faa.gz");
        let mut encoder = GzEncoder::new(File::create(&gz_path).unwrap(), Compression::default());
        encoder.write_all(b">c1\nMAAA\n").unwrap();
        encoder.finish().unwrap();
        let plain = write_file(&dir, "d.faa", ">d1\nMCCC\n");
        let out = dir.path().join("all.faa");

        concatenate_files(&[gz_path, plain], &out).unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), ">c1\nMAAA\n>d1\nMCCC\n");
    }

    #[test]
    fn test_concatenate_last_file_without_newline() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.faa", ">a1\nMKV\n");
        let b = write_file(&dir, "b.faa", ">b1\nMST");
        let out = dir.path().join("all.faa");

        let written = concatenate_files(&[a, b], &out).unwrap();

        let content = std::fs::read_to_string(&out).unwrap();
        assert_eq!(content, ">a1\nMKV\n>b1\nMST\n");
        assert_eq!(written, content.len() as u64);
    }

    #[test]
    fn test_concatenate_skips_over_empty_file() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.faa", ">a1\nMKV\n");
        let empty = write_file(&dir, "empty.faa", "");
        let b = write_file(&dir, "b.faa", ">b1\nMST\n");
        let out = dir.path().join("all.faa");

        concatenate_files(&[a, empty, b], &out).unwrap();

        assert_eq!(std::fs::read_to_string(&out).unwrap(), ">a1\nMKV\n>b1\nMST\n");
    }

    #[test]
    fn test_scan_empty_file_yields_no_genes() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "empty.faa", "");
        assert!(scan_gene_ids(&path).unwrap().is_empty());

        let other = write_file(&dir, "GA.faa", ">a1\nMKV\n");
        let index = GeneIndex::from_files(&[other, path]).unwrap();
        assert_eq!(index.num_genomes(), 2);
        assert_eq!(index.num_genes(), 1);
    }

    #[test]
    fn test_tsv_keeps_hash_prefixed_gene_ids() {
        let dir = TempDir::new().unwrap();
        let mut index = GeneIndex::new();
        index.insert("#p1".to_string(), "GA");
        index.insert("b1".to_string(), "GB");
        let tsv = dir.path().join("gene_index.tsv");
        index.write_tsv(&tsv).unwrap();

        let loaded = GeneIndex::read_tsv(&tsv).unwrap();
        assert_eq!(loaded.num_genes(), 2);
        assert_eq!(loaded.genome_of("#p1"), Some("GA"));
    }

    #[test]
    fn test_scan_gene_ids_uses_first_token() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "g.faa", ">gene_1 hypothetical protein\nMKV\n>gene_2\nMLL\n");

        let ids = scan_gene_ids(&path).unwrap();
        assert_eq!(ids, vec!["gene_1", "gene_2"]);
    }

    #[test]
    fn test_gene_index_from_files_and_tsv() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "GA.faa", ">a1\nMKV\n>a2\nMLL\n");
        let b = write_file(&dir, "GB.faa", ">b1\nMST\n>a1\nMQQ\n");

        let index = GeneIndex::from_files(&[a, b]).unwrap();
        assert_eq!(index.num_genomes(), 2);
        assert_eq!(index.num_genes(), 3);
        assert_eq!(index.genome_of("a1"), Some("GA"));
        assert_eq!(index.genome_of("b1"), Some("GB"));

        let tsv = dir.path().join("gene_index.tsv");
        index.write_tsv(&tsv).unwrap();
        assert_eq!(
            std::fs::read_to_string(&tsv).unwrap(),
            "a1\tGA\na2\tGA\nb1\tGB\n"
        );

        let loaded = GeneIndex::read_tsv(&tsv).unwrap();
        assert_eq!(loaded.genome_of("a2"), Some("GA"));
        assert_eq!(loaded.num_genes(), 3);
    }

    #[test]
    fn test_read_tsv_rejects_malformed_line() {
        let dir = TempDir::new().unwrap();
        let tsv = write_file(&dir, "bad.tsv", "a1\tGA\nno_tab_here\n");
        let err = GeneIndex::read_tsv(&tsv).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_scan_missing_file_errors() {
        assert!(scan_gene_ids("/nonexistent/genes.faa").is_err());
    }
}
