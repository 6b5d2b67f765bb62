//! Filter command implementation - reduce a hit table to reciprocal best hits

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use rbh_core::io::HitTableParser;
use rbh_core::rbh::{summarize_pairs, write_rbh_tsv, write_summary_tsv, BestHitTable};
use rbh_core::GeneIndex;

use crate::config::Config;
use crate::error::{print_error_and_exit, CliError};

pub fn execute(
    config: &Config,
    hits: PathBuf,
    gene_index: Option<PathBuf>,
    out: Option<PathBuf>,
    summary: Option<PathBuf>,
) -> Result<()> {
    if !hits.exists() {
        print_error_and_exit(&CliError::file_not_found(hits));
    }

    // Companion files default to the directory holding the hit table
    let base_dir = hits.parent().map(Path::to_path_buf).unwrap_or_default();
    let gene_index = gene_index.unwrap_or_else(|| base_dir.join(rbh_core::reciprocal::GENE_INDEX_FILE));
    if !gene_index.exists() {
        print_error_and_exit(&CliError::file_not_found(gene_index));
    }
    let out = out.unwrap_or_else(|| base_dir.join(&config.filter.output));

    run_filter(&hits, &gene_index, &out, summary.as_deref())
}

/// Read `hits` and `gene_index`, write reciprocal best hits to `out` and optionally a
/// per-genome-pair summary.
pub fn run_filter(hits: &Path, gene_index: &Path, out: &Path, summary: Option<&Path>) -> Result<()> {
    log::info!("Identifying reciprocal best hits in {}", hits.display());

    let index = GeneIndex::read_tsv(gene_index)
        .context("Failed to load gene index")?;
    log::info!(
        "Loaded gene index: {} genes across {} genomes",
        index.num_genes(),
        index.num_genomes()
    );

    let table = BestHitTable::from_hits(HitTableParser::iter_file(hits)?, &index)
        .with_context(|| format!("Failed to read hit table {}", hits.display()))?;
    let stats = table.stats();
    log::info!(
        "Read {} hits ({} within the same genome)",
        stats.hits_read,
        stats.same_genome
    );

    let pairs = table.reciprocal_pairs(&index);
    write_rbh_tsv(&pairs, out).context("Failed to write reciprocal best hits")?;
    log::info!("Wrote {} reciprocal best hits to {}", pairs.len(), out.display());

    if let Some(summary_path) = summary {
        let per_pair = summarize_pairs(&pairs);
        write_summary_tsv(&per_pair, summary_path).context("Failed to write summary")?;
        log::info!(
            "Wrote summary for {} genome pairs to {}",
            per_pair.len(),
            summary_path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_run_filter_writes_outputs() -> Result<()> {
        let dir = TempDir::new()?;
        let hits = dir.path().join("all_hits.tsv");
        let index = dir.path().join("gene_index.tsv");
        let out = dir.path().join("rbh.tsv");
        let summary = dir.path().join("rbh_summary.tsv");

        std::fs::write(
            &hits,
            "x1\ty1\t80.0\t100\t20\t0\t1\t100\t1\t100\t1e-30\t150.0\n\
             y1\tx1\t82.0\t100\t18\t0\t1\t100\t1\t100\t1e-31\t155.0\n\
             x1\tx1\t100.0\t100\t0\t0\t1\t100\t1\t100\t1e-60\t210.0\n",
        )?;
        std::fs::write(&index, "x1\tX\ny1\tY\n")?;

        run_filter(&hits, &index, &out, Some(&summary))?;

        let rbh = std::fs::read_to_string(&out)?;
        assert_eq!(rbh.lines().count(), 2);
        assert!(rbh.lines().nth(1).unwrap().starts_with("x1\tX\ty1\tY\t80.00\t82.00"));

        let summary = std::fs::read_to_string(&summary)?;
        assert_eq!(summary.lines().nth(1), Some("X\tY\t1\t81.00\t0.00"));
        Ok(())
    }
}
