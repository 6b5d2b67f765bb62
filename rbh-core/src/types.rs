use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

pub type GeneId = String;
pub type GenomeId = String;

/// One row of a BLAST tabular (outfmt 6) hit table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub query: GeneId,
    pub subject: GeneId,
    pub identity: f64,
    pub alignment_len: u32,
    pub mismatches: u32,
    pub gap_opens: u32,
    pub query_start: u32,
    pub query_end: u32,
    pub subject_start: u32,
    pub subject_end: u32,
    pub evalue: f64,
    pub bitscore: f64,
}

impl Hit {
    /// Ranks two hits of the same query: higher bitscore wins, then lower e-value.
    /// `Ordering::Greater` means `self` is the better hit.
    pub fn rank_against(&self, other: &Hit) -> Ordering {
        self.bitscore
            .partial_cmp(&other.bitscore)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                other
                    .evalue
                    .partial_cmp(&self.evalue)
                    .unwrap_or(Ordering::Equal)
            })
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{:.1}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:e}\t{:.1}",
            self.query,
            self.subject,
            self.identity,
            self.alignment_len,
            self.mismatches,
            self.gap_opens,
            self.query_start,
            self.query_end,
            self.subject_start,
            self.subject_end,
            self.evalue,
            self.bitscore,
        )
    }
}

/// A pair of genes from different genomes that are each other's best hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReciprocalHit {
    pub gene_a: GeneId,
    pub genome_a: GenomeId,
    pub gene_b: GeneId,
    pub genome_b: GenomeId,
    pub identity_ab: f64,
    pub identity_ba: f64,
    pub evalue_ab: f64,
    pub evalue_ba: f64,
    pub bitscore_ab: f64,
    pub bitscore_ba: f64,
}

impl ReciprocalHit {
    pub fn mean_identity(&self) -> f64 {
        (self.identity_ab + self.identity_ba) / 2.0
    }
}

/// Maps every gene in the concatenated corpus back to the genome it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneIndex {
    genomes: Vec<GenomeId>,
    gene_to_genome: HashMap<GeneId, u32>,
}

impl GeneIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a genome and return its numeric handle. Re-adding returns the existing handle.
    pub fn add_genome(&mut self, genome: &str) -> u32 {
        if let Some(pos) = self.genomes.iter().position(|g| g == genome) {
            return pos as u32;
        }
        self.genomes.push(genome.to_string());
        (self.genomes.len() - 1) as u32
    }

    /// Insert a gene. Returns `false` and keeps the earlier mapping if the ID is already known.
    pub fn insert(&mut self, gene: GeneId, genome: &str) -> bool {
        let handle = self.add_genome(genome);
        match self.gene_to_genome.entry(gene) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(handle);
                true
            }
        }
    }

    pub fn genome_of(&self, gene: &str) -> Option<&str> {
        self.gene_to_genome
            .get(gene)
            .and_then(|&h| self.genomes.get(h as usize))
            .map(String::as_str)
    }

    pub fn num_genomes(&self) -> usize {
        self.genomes.len()
    }

    pub fn num_genes(&self) -> usize {
        self.gene_to_genome.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gene_to_genome.is_empty()
    }

    /// Iterate `(gene, genome)` pairs in gene order.
    pub fn sorted_entries(&self) -> Vec<(&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .gene_to_genome
            .iter()
            .map(|(gene, &h)| (gene.as_str(), self.genomes[h as usize].as_str()))
            .collect();
        entries.sort_unstable();
        entries
    }
}
