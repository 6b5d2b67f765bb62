//! All-vs-all protein search across genomes
//!
//! Every genome's gene file is concatenated into one corpus, indexed once, and
//! searched against itself. The resulting hit table feeds [`crate::rbh`].

use std::path::{Path, PathBuf};
use std::time::Instant;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::search::{ProteinSearchTool, SearchError, SearchParams, DEFAULT_HITS_PER_GENOME};
use crate::types::GeneIndex;
use crate::io::fasta::concatenate_files;

pub const GENE_FILE: &str = "all_genes.faa";
pub const DB_NAME: &str = "all_genes";
pub const DB_EXTENSION: &str = "dmnd";
pub const HITS_FILE: &str = "all_hits.tsv";
pub const GENE_INDEX_FILE: &str = "gene_index.tsv";
pub const MANIFEST_FILE: &str = "search_manifest.json";

/// Paths written by a reciprocal search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutputs {
    pub gene_file: PathBuf,
    /// Database path as passed to the engine (without extension)
    pub db: PathBuf,
    pub db_file: PathBuf,
    pub hits_file: PathBuf,
    pub gene_index_file: PathBuf,
    pub manifest_file: PathBuf,
}

impl SearchOutputs {
    pub fn in_dir(output_dir: &Path) -> Self {
        let db = output_dir.join(DB_NAME);
        Self {
            gene_file: output_dir.join(GENE_FILE),
            db_file: db.with_extension(DB_EXTENSION),
            db,
            hits_file: output_dir.join(HITS_FILE),
            gene_index_file: output_dir.join(GENE_INDEX_FILE),
            manifest_file: output_dir.join(MANIFEST_FILE),
        }
    }
}

/// Record of a completed search, written next to the hit table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchManifest {
    pub created: chrono::DateTime<chrono::Utc>,
    pub tool: String,
    pub tool_version: String,
    pub inputs: Vec<PathBuf>,
    pub num_genomes: usize,
    pub num_genes: usize,
    pub cpus: usize,
    pub evalue: f64,
    pub per_identity: f64,
    pub max_target_seqs: usize,
    pub runtime_seconds: f64,
    pub outputs: SearchOutputs,
}

impl SearchManifest {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write manifest {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Reciprocal search driver over any [`ProteinSearchTool`]
pub struct ReciprocalSearch<T: ProteinSearchTool> {
    tool: T,
    cpus: usize,
    hits_per_genome: usize,
}

impl<T: ProteinSearchTool> ReciprocalSearch<T> {
    pub fn new(tool: T, cpus: usize) -> Self {
        Self {
            tool,
            cpus,
            hits_per_genome: DEFAULT_HITS_PER_GENOME,
        }
    }

    /// Override how many targets per genome each query may report
    pub fn with_hits_per_genome(mut self, hits_per_genome: usize) -> Self {
        self.hits_per_genome = hits_per_genome;
        self
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Search parameters that [`ReciprocalSearch::run`] passes to the engine
    pub fn params_for(&self, num_genomes: usize, evalue: f64, per_identity: f64) -> SearchParams {
        SearchParams::for_genomes(self.cpus, evalue, per_identity, num_genomes, self.hits_per_genome)
    }

    /// Search all genes of `aa_gene_files` against each other.
    ///
    /// Writes the concatenated corpus, its index, the gene-to-genome map and the hit
    /// table into `output_dir`, which is created if needed.
    pub fn run<P: AsRef<Path> + Sync>(
        &self,
        aa_gene_files: &[P],
        evalue: f64,
        per_identity: f64,
        output_dir: &Path,
    ) -> Result<SearchOutputs> {
        if aa_gene_files.is_empty() {
            return Err(SearchError::InvalidParams("no gene files to search".to_string()).into());
        }
        let params = self.params_for(aa_gene_files.len(), evalue, per_identity);
        params.validate()?;

        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;
        let outputs = SearchOutputs::in_dir(output_dir);
        let start_time = Instant::now();

        log::info!("Creating {} database (be patient!).", self.tool.name());
        // Inputs are fully scanned before anything is written to output_dir.
        let gene_index = GeneIndex::from_files(aa_gene_files)?;
        concatenate_files(aa_gene_files, &outputs.gene_file)
            .context("Failed to concatenate gene files")?;
        gene_index.write_tsv(&outputs.gene_index_file)?;

        self.tool
            .make_db(&params, &outputs.gene_file, &outputs.db)
            .context("Failed to build search database")?;

        log::info!("Identifying hits between all pairs of genomes (be patient!).");
        self.tool
            .blastp(&params, &outputs.gene_file, &outputs.db, &outputs.hits_file)
            .context("Failed to search genes against database")?;

        let runtime_seconds = start_time.elapsed().as_secs_f64();
        log::info!(
            "Search completed in {:.2}s; hits written to {}",
            runtime_seconds,
            outputs.hits_file.display()
        );

        let manifest = SearchManifest {
            created: chrono::Utc::now(),
            tool: self.tool.name().to_string(),
            tool_version: self.tool.version(),
            inputs: aa_gene_files.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            num_genomes: gene_index.num_genomes(),
            num_genes: gene_index.num_genes(),
            cpus: params.cpus,
            evalue: params.evalue,
            per_identity: params.per_identity,
            max_target_seqs: params.max_target_seqs,
            runtime_seconds,
            outputs: outputs.clone(),
        };
        manifest.save(&outputs.manifest_file)?;

        Ok(outputs)
    }
}
