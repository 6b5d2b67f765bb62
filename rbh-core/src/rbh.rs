//! Reciprocal best-hit filtering
//!
//! A gene's best hit in another genome is its highest-scoring hit there
//! (bitscore, then e-value, then first seen). Two genes from different genomes
//! form a reciprocal best hit when each is the other's best hit in its genome.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::{GeneId, GeneIndex, GenomeId, Hit, ReciprocalHit};

pub const RBH_HEADER: &str = "gene_a\tgenome_a\tgene_b\tgenome_b\tidentity_ab\tidentity_ba\tevalue_ab\tevalue_ba\tbitscore_ab\tbitscore_ba";
pub const SUMMARY_HEADER: &str = "genome_a\tgenome_b\treciprocal_hits\tmean_identity\tstd_identity";

/// Counters collected while building a [`BestHitTable`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub hits_read: u64,
    pub same_genome: u64,
    pub unknown_gene: u64,
}

/// Best hit of every gene in every other genome
#[derive(Debug, Default)]
pub struct BestHitTable {
    best: HashMap<(GeneId, GenomeId), Hit>,
    stats: FilterStats,
}

impl BestHitTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from a stream of hits, stopping at the first read error
    pub fn from_hits<I>(hits: I, index: &GeneIndex) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Hit>>,
    {
        let mut table = Self::new();
        for hit in hits {
            table.add(hit?, index);
        }

        if table.stats.unknown_gene > 0 {
            log::warn!(
                "{} hits reference genes missing from the gene index and were skipped",
                table.stats.unknown_gene
            );
        }
        log::debug!("Best-hit table: {:?}", table.stats);
        Ok(table)
    }

    /// Offer a hit; it replaces the current best for its (query, subject genome) only if it ranks strictly higher
    pub fn add(&mut self, hit: Hit, index: &GeneIndex) {
        self.stats.hits_read += 1;

        let (query_genome, subject_genome) =
            match (index.genome_of(&hit.query), index.genome_of(&hit.subject)) {
                (Some(q), Some(s)) => (q, s),
                _ => {
                    log::trace!("Skipping hit with unindexed gene: {}", hit);
                    self.stats.unknown_gene += 1;
                    return;
                }
            };

        if query_genome == subject_genome {
            log::trace!("Skipping hit within {}: {}", query_genome, hit);
            self.stats.same_genome += 1;
            return;
        }

        let key = (hit.query.clone(), subject_genome.to_string());
        match self.best.get_mut(&key) {
            Some(current) => {
                if hit.rank_against(current) == std::cmp::Ordering::Greater {
                    *current = hit;
                }
            }
            None => {
                self.best.insert(key, hit);
            }
        }
    }

    pub fn best_hit(&self, gene: &str, genome: &str) -> Option<&Hit> {
        self.best.get(&(gene.to_string(), genome.to_string()))
    }

    pub fn stats(&self) -> FilterStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Pairs whose best hits agree in both directions, each reported once with
    /// `genome_a < genome_b`, sorted by genomes then genes.
    pub fn reciprocal_pairs(&self, index: &GeneIndex) -> Vec<ReciprocalHit> {
        let mut pairs = Vec::new();

        for ((gene_a, genome_b), hit_ab) in &self.best {
            let genome_a = match index.genome_of(gene_a) {
                Some(g) => g,
                None => continue,
            };
            if genome_a >= genome_b.as_str() {
                continue;
            }

            let gene_b = &hit_ab.subject;
            let Some(hit_ba) = self.best_hit(gene_b, genome_a) else {
                continue;
            };
            if &hit_ba.subject != gene_a {
                continue;
            }

            pairs.push(ReciprocalHit {
                gene_a: gene_a.clone(),
                genome_a: genome_a.to_string(),
                gene_b: gene_b.clone(),
                genome_b: genome_b.clone(),
                identity_ab: hit_ab.identity,
                identity_ba: hit_ba.identity,
                evalue_ab: hit_ab.evalue,
                evalue_ba: hit_ba.evalue,
                bitscore_ab: hit_ab.bitscore,
                bitscore_ba: hit_ba.bitscore,
            });
        }

        pairs.sort_by(|x, y| {
            (&x.genome_a, &x.genome_b, &x.gene_a, &x.gene_b)
                .cmp(&(&y.genome_a, &y.genome_b, &y.gene_a, &y.gene_b))
        });
        pairs
    }
}

/// Reciprocal best hits for an in-memory hit list
pub fn reciprocal_best_hits(hits: &[Hit], index: &GeneIndex) -> Vec<ReciprocalHit> {
    let mut table = BestHitTable::new();
    for hit in hits {
        table.add(hit.clone(), index);
    }
    table.reciprocal_pairs(index)
}

/// Reciprocal-hit count and identity statistics for one genome pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub reciprocal_hits: usize,
    pub mean_identity: f64,
    pub std_identity: f64,
}

/// Summarise reciprocal hits per genome pair; identity is the mean of both directions
pub fn summarize_pairs(pairs: &[ReciprocalHit]) -> BTreeMap<(GenomeId, GenomeId), PairSummary> {
    let mut identities: BTreeMap<(GenomeId, GenomeId), Vec<f64>> = BTreeMap::new();
    for pair in pairs {
        identities
            .entry((pair.genome_a.clone(), pair.genome_b.clone()))
            .or_default()
            .push(pair.mean_identity());
    }

    identities
        .into_iter()
        .map(|(key, values)| {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            (
                key,
                PairSummary {
                    reciprocal_hits: values.len(),
                    mean_identity: mean,
                    std_identity: variance.sqrt(),
                },
            )
        })
        .collect()
}

/// Write reciprocal hits as a tab-separated table with header
pub fn write_rbh_tsv(pairs: &[ReciprocalHit], output: &Path) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", RBH_HEADER)?;
    for p in pairs {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.2}\t{:.2}\t{:e}\t{:e}\t{:.1}\t{:.1}",
            p.gene_a,
            p.genome_a,
            p.gene_b,
            p.genome_b,
            p.identity_ab,
            p.identity_ba,
            p.evalue_ab,
            p.evalue_ba,
            p.bitscore_ab,
            p.bitscore_ba,
        )?;
    }

    writer.flush()?;
    Ok(())
}

/// Write per-genome-pair summaries as a tab-separated table with header
pub fn write_summary_tsv(
    summary: &BTreeMap<(GenomeId, GenomeId), PairSummary>,
    output: &Path,
) -> Result<()> {
    let file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "{}", SUMMARY_HEADER)?;
    for ((a, b), s) in summary {
        writeln!(
            writer,
            "{}\t{}\t{}\t{:.2}\t{:.2}",
            a, b, s.reciprocal_hits, s.mean_identity, s.std_identity
        )?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(query: &str, subject: &str, bitscore: f64) -> Hit {
        Hit {
            query: query.to_string(),
            subject: subject.to_string(),
            identity: bitscore / 4.0,
            alignment_len: 100,
            mismatches: 0,
            gap_opens: 0,
            query_start: 1,
            query_end: 100,
            subject_start: 1,
            subject_end: 100,
            evalue: 1e-30,
            bitscore,
        }
    }

    fn index() -> GeneIndex {
        let mut index = GeneIndex::new();
        for (gene, genome) in [("a1", "A"), ("a2", "A"), ("b1", "B"), ("b2", "B"), ("c1", "C")] {
            index.insert(gene.to_string(), genome);
        }
        index
    }

    #[test]
    fn test_simple_reciprocal_pair() {
        let hits = vec![
            hit("a1", "a1", 400.0),
            hit("a1", "b1", 300.0),
            hit("a1", "b2", 200.0),
            hit("b1", "a1", 310.0),
            hit("b1", "a2", 100.0),
        ];
        let pairs = reciprocal_best_hits(&hits, &index());

        assert_eq!(pairs.len(), 1);
        let p = &pairs[0];
        assert_eq!((p.gene_a.as_str(), p.genome_a.as_str()), ("a1", "A"));
        assert_eq!((p.gene_b.as_str(), p.genome_b.as_str()), ("b1", "B"));
        assert_eq!(p.bitscore_ab, 300.0);
        assert_eq!(p.bitscore_ba, 310.0);
    }

    #[test]
    fn test_non_reciprocal_is_dropped() {
        // b1's best hit in A is a2, not a1
        let hits = vec![
            hit("a1", "b1", 300.0),
            hit("b1", "a1", 100.0),
            hit("b1", "a2", 250.0),
        ];
        assert!(reciprocal_best_hits(&hits, &index()).is_empty());
    }

    #[test]
    fn test_same_genome_hits_ignored() {
        // a1 scores higher against a2 than b1, but paralogs never count
        let hits = vec![
            hit("a1", "a2", 500.0),
            hit("a1", "b1", 300.0),
            hit("b1", "a1", 300.0),
        ];
        let mut table = BestHitTable::new();
        for h in hits {
            table.add(h, &index());
        }
        assert_eq!(table.stats().same_genome, 1);
        assert_eq!(table.reciprocal_pairs(&index()).len(), 1);
    }

    #[test]
    fn test_tie_keeps_first_seen() {
        let hits = vec![
            hit("a1", "b1", 300.0),
            hit("a1", "b2", 300.0),
            hit("b1", "a1", 300.0),
            hit("b2", "a1", 300.0),
        ];
        let pairs = reciprocal_best_hits(&hits, &index());
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].gene_b, "b1");
    }

    #[test]
    fn test_unknown_genes_counted() {
        let hits = vec![Ok(hit("a1", "zz", 300.0)), Ok(hit("a1", "b1", 200.0))];
        let table = BestHitTable::from_hits(hits, &index()).unwrap();
        assert_eq!(table.stats().hits_read, 2);
        assert_eq!(table.stats().unknown_gene, 1);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_pairs_sorted_across_genomes() {
        let hits = vec![
            hit("c1", "a1", 200.0),
            hit("a1", "c1", 200.0),
            hit("b1", "a1", 300.0),
            hit("a1", "b1", 300.0),
            hit("b2", "c1", 150.0),
            hit("c1", "b2", 150.0),
        ];
        let pairs = reciprocal_best_hits(&hits, &index());
        let keys: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.genome_a.as_str(), p.genome_b.as_str()))
            .collect();
        assert_eq!(keys, vec![("A", "B"), ("A", "C"), ("B", "C")]);
    }

    #[test]
    fn test_summarize_pairs() {
        let hits = vec![
            hit("a1", "b1", 360.0),
            hit("b1", "a1", 360.0),
            hit("a2", "b2", 280.0),
            hit("b2", "a2", 280.0),
        ];
        let summary = summarize_pairs(&reciprocal_best_hits(&hits, &index()));
        let ab = &summary[&("A".to_string(), "B".to_string())];
        assert_eq!(ab.reciprocal_hits, 2);
        assert!((ab.mean_identity - 80.0).abs() < 1e-9);
        assert!((ab.std_identity - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_write_rbh_tsv() -> Result<()> {
        let dir = tempfile::TempDir::new()?;
        let out = dir.path().join("rbh.tsv");
        let hits = vec![hit("a1", "b1", 300.0), hit("b1", "a1", 300.0)];

        write_rbh_tsv(&reciprocal_best_hits(&hits, &index()), &out)?;

        let content = std::fs::read_to_string(&out)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], RBH_HEADER);
        assert!(lines[1].starts_with("a1\tA\tb1\tB\t75.00\t75.00\t"));
        assert_eq!(lines.len(), 2);
        Ok(())
    }
}
