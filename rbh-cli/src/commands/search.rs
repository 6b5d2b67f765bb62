//! Search command implementation - all-vs-all protein search with DIAMOND

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use rbh_core::io::genome_id;
use rbh_core::{Diamond, ProteinSearchTool, ReciprocalSearch, SearchParams};

use crate::config::Config;
use crate::error::{print_error_and_exit, CliError, CliResult};

pub struct SearchArgs {
    pub genes: Vec<PathBuf>,
    pub out_dir: PathBuf,
    pub evalue: Option<f64>,
    pub per_identity: Option<f64>,
    pub hits_per_genome: Option<usize>,
    pub extension: Option<String>,
    pub diamond: Option<PathBuf>,
    pub filter: bool,
}

pub fn execute(config: &Config, threads: Option<usize>, quiet: bool, args: SearchArgs) -> Result<()> {
    let extension = args.extension.unwrap_or_else(|| config.search.extension.clone());
    let gene_files = match collect_gene_files(&args.genes, &extension) {
        Ok(files) => files,
        Err(e) => print_error_and_exit(&e),
    };

    let params = build_search_params(config, threads, args.evalue, args.per_identity, args.hits_per_genome, gene_files.len());
    if let Err(e) = params.validate() {
        print_error_and_exit(&e.into());
    }

    let diamond = match locate_diamond(args.diamond.or_else(|| config.search.diamond.clone())) {
        Ok(diamond) => diamond,
        Err(e) => print_error_and_exit(&e),
    };
    log::info!("Using {} ({})", diamond.binary_path().display(), diamond.version());

    log::info!("Searching {} genomes with {} threads", gene_files.len(), params.cpus);
    log::info!("Output directory: {}", args.out_dir.display());

    let hits_per_genome = args.hits_per_genome.unwrap_or(config.search.hits_per_genome);
    let search = ReciprocalSearch::new(diamond, params.cpus).with_hits_per_genome(hits_per_genome);

    let bar = super::spinner(quiet, format!("Running diamond over {} genomes", gene_files.len()));
    let result = search.run(&gene_files, params.evalue, params.per_identity, &args.out_dir);
    bar.finish_and_clear();
    let outputs = result.context("Reciprocal search failed")?;

    log::info!("Hit table: {}", outputs.hits_file.display());
    log::info!("Gene index: {}", outputs.gene_index_file.display());

    if args.filter {
        let rbh_out = args.out_dir.join(&config.filter.output);
        let summary_out = args.out_dir.join(&config.filter.summary);
        super::filter::run_filter(&outputs.hits_file, &outputs.gene_index_file, &rbh_out, Some(&summary_out))?;
    }

    Ok(())
}

/// Find a runnable diamond binary, either the explicit one or the one on `PATH`.
pub fn locate_diamond(binary_path: Option<PathBuf>) -> CliResult<Diamond> {
    Diamond::locate(binary_path).map_err(|e| {
        log::error!("Make sure diamond is on your system path.");
        CliError::from(e)
    })
}

/// Resolve CLI arguments into gene files. Directories contribute every file ending in
/// `.<extension>` (optionally gzipped), sorted by name.
pub fn collect_gene_files(paths: &[PathBuf], extension: &str) -> CliResult<Vec<PathBuf>> {
    let suffix = format!(".{}", extension.trim_start_matches('.'));
    let gz_suffix = format!("{}.gz", suffix);
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file())
                .filter(|p| {
                    let name = p.to_string_lossy();
                    name.ends_with(&suffix) || name.ends_with(&gz_suffix)
                })
                .collect();
            found.sort();
            log::debug!("Found {} gene files in {}", found.len(), path.display());
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            return Err(CliError::file_not_found(path.clone()));
        }
    }

    if files.is_empty() {
        return Err(CliError::no_inputs(format!(
            "no *{} files among {} input path(s)",
            suffix,
            paths.len()
        )));
    }

    check_unique_genomes(&files)?;
    Ok(files)
}

fn check_unique_genomes(files: &[PathBuf]) -> CliResult<()> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    for file in files {
        let id = genome_id(file);
        if let Some(previous) = seen.insert(id.clone(), file.as_path()) {
            return Err(CliError::validation(format!(
                "{} and {} both map to genome '{}'",
                previous.display(),
                file.display(),
                id
            )));
        }
    }
    Ok(())
}

fn build_search_params(
    config: &Config,
    threads: Option<usize>,
    evalue: Option<f64>,
    per_identity: Option<f64>,
    hits_per_genome: Option<usize>,
    num_genomes: usize,
) -> SearchParams {
    // CLI args, then config, then defaults
    SearchParams::for_genomes(
        threads.unwrap_or(config.general.threads),
        evalue.unwrap_or(config.search.evalue),
        per_identity.unwrap_or(config.search.per_identity),
        num_genomes,
        hits_per_genome.unwrap_or(config.search.hits_per_genome),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::format_error_with_suggestions;
    use tempfile::TempDir;

    #[test]
    fn test_locate_diamond_missing_binary() {
        let dir = TempDir::new().unwrap();
        let err = locate_diamond(Some(dir.path().join("bin").join("diamond"))).unwrap_err();

        assert!(matches!(err, CliError::ExternalTool { .. }));
        assert!(format_error_with_suggestions(&err).contains("bioconda"));
    }

    #[test]
    fn test_build_search_params_prefers_cli() {
        let config = Config::default();
        let params = build_search_params(&config, Some(3), Some(1e-10), None, None, 4);
        assert_eq!(params.cpus, 3);
        assert_eq!(params.evalue, 1e-10);
        assert_eq!(params.per_identity, config.search.per_identity);
        assert_eq!(params.max_target_seqs, 40);
    }

    #[test]
    fn test_collect_gene_files_from_directory() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::write(dir.path().join("b.faa"), ">b1\nM\n")?;
        std::fs::write(dir.path().join("a.faa.gz"), b"")?;
        std::fs::write(dir.path().join("notes.txt"), "x")?;

        let files = collect_gene_files(&[dir.path().to_path_buf()], "faa")?;
        let names: Vec<String> = files
            .iter()
            .map(|f| f.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.faa.gz", "b.faa"]);
        Ok(())
    }

    #[test]
    fn test_collect_gene_files_errors() {
        let missing = collect_gene_files(&[PathBuf::from("/nonexistent/x.faa")], "faa");
        assert!(matches!(missing, Err(CliError::FileNotFound { .. })));

        let dir = TempDir::new().unwrap();
        let empty = collect_gene_files(&[dir.path().to_path_buf()], "faa");
        assert!(matches!(empty, Err(CliError::NoInputs { .. })));
    }

    #[test]
    fn test_duplicate_genome_ids_rejected() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        let a = dir.path().join("G1.faa");
        let b = sub.join("G1.faa");
        std::fs::write(&a, ">x\nM\n").unwrap();
        std::fs::write(&b, ">y\nM\n").unwrap();

        let result = collect_gene_files(&[a, b], "faa");
        assert!(matches!(result, Err(CliError::Validation { .. })));
    }
}
