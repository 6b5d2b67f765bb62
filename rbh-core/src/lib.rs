//! rbh core library
//!
//! DIAMOND orchestration, hit-table parsing and reciprocal best-hit filtering
//! for comparing the predicted proteomes of many genomes.

pub mod types;
pub mod io;
pub mod search;
pub mod reciprocal;
pub mod rbh;

// Re-export commonly used types and functions
pub use types::{GeneIndex, Hit, ReciprocalHit};
pub use search::{Diamond, ProteinSearchTool, SearchError, SearchParams, SearchResult};
pub use reciprocal::{ReciprocalSearch, SearchManifest, SearchOutputs};
pub use rbh::{reciprocal_best_hits, summarize_pairs, BestHitTable, PairSummary};
pub use io::{HitTableParser, concatenate_files};

/// Version information for the rbh core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
