//! File format I/O for rbh
//!
//! Protein FASTA corpora going into the search engine and the tabular hit
//! tables coming out of it.

pub mod fasta;
pub mod hits;

pub use fasta::{concatenate_files, genome_id, scan_gene_ids, FastaError};
pub use hits::{HitError, HitIterator, HitTableParser};
