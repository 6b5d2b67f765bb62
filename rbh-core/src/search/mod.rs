//! External protein search engines
//!
//! The search itself (indexing, alignment, scoring) is delegated to an external
//! binary. This module defines the parameters passed to it and the trait the
//! reciprocal pipeline drives.

use std::path::Path;

pub mod diamond;

pub use diamond::Diamond;

/// Parameters forwarded to the search engine
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Threads the engine may use
    pub cpus: usize,
    /// E-value threshold for reporting hits
    pub evalue: f64,
    /// Percent identity threshold for reporting hits
    pub per_identity: f64,
    /// Maximum number of target sequences reported per query
    pub max_target_seqs: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            cpus: 1,
            evalue: 1e-3,
            per_identity: 30.0,
            max_target_seqs: DEFAULT_HITS_PER_GENOME,
        }
    }
}

/// Hits kept per query for every genome in the corpus
pub const DEFAULT_HITS_PER_GENOME: usize = 10;

impl SearchParams {
    /// Parameters for an all-vs-all search over `num_genomes` gene files.
    /// Each query may report `hits_per_genome` targets per genome so that its best hit in
    /// every genome survives the engine's own truncation.
    pub fn for_genomes(
        cpus: usize,
        evalue: f64,
        per_identity: f64,
        num_genomes: usize,
        hits_per_genome: usize,
    ) -> Self {
        Self {
            cpus,
            evalue,
            per_identity,
            max_target_seqs: num_genomes * hits_per_genome,
        }
    }

    pub fn validate(&self) -> SearchResult<()> {
        if self.cpus == 0 {
            return Err(SearchError::InvalidParams("cpus must be at least 1".to_string()));
        }
        if !self.evalue.is_finite() || self.evalue <= 0.0 {
            return Err(SearchError::InvalidParams(format!(
                "e-value must be a positive number, got {}",
                self.evalue
            )));
        }
        if !(0.0..=100.0).contains(&self.per_identity) {
            return Err(SearchError::InvalidParams(format!(
                "percent identity must be within 0-100, got {}",
                self.per_identity
            )));
        }
        if self.max_target_seqs == 0 {
            return Err(SearchError::InvalidParams(
                "max target sequences must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur while driving the search engine
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{tool} not found on the system path")]
    ToolNotFound { tool: String },

    #[error("{tool} {step} failed (exit code {code:?}): {stderr}")]
    ToolFailed {
        tool: String,
        step: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

/// A protein search engine that builds an index over a FASTA corpus and searches it
pub trait ProteinSearchTool {
    /// Build a searchable index from `fasta` at `db`
    fn make_db(&self, params: &SearchParams, fasta: &Path, db: &Path) -> SearchResult<()>;

    /// Search every sequence in `query` against `db`, writing a tabular hit table to `output`
    fn blastp(
        &self,
        params: &SearchParams,
        query: &Path,
        db: &Path,
        output: &Path,
    ) -> SearchResult<()>;

    /// Name of the engine
    fn name(&self) -> &'static str;

    /// Version string reported by the engine
    fn version(&self) -> String;

    /// Check if the engine can be invoked
    fn is_available(&self) -> bool {
        true
    }
}
