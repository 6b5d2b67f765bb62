use clap::{Parser, Subcommand};
use std::path::PathBuf;
use anyhow::Result;

mod config;
mod commands;
mod error;

use config::Config;
use error::{print_error_and_exit, CliError};

#[derive(Parser)]
#[command(name = "rbh")]
#[command(about = "rbh - reciprocal best-hit search across genomes")]
#[command(version)]
#[command(long_about = "
rbh concatenates the predicted proteins of many genomes, searches them all
against each other with DIAMOND, and reduces the hit table to reciprocal best hits.

Examples:
  rbh search genomes/ --out-dir work --evalue 1e-5 --per-identity 30
  rbh search GA.faa GB.faa GC.faa --out-dir work --filter
  rbh filter --hits work/all_hits.tsv --summary work/rbh_summary.tsv
  rbh config --example
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Number of threads passed to diamond
    #[arg(short, long, global = true)]
    pub threads: Option<usize>,

    /// Verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search all genes of all genomes against each other with DIAMOND
    Search {
        /// Protein FASTA files, or directories containing them
        #[arg(required = true, num_args = 1..)]
        genes: Vec<PathBuf>,

        /// Directory for the corpus, database and hit table
        #[arg(short, long, required = true)]
        out_dir: PathBuf,

        /// E-value threshold for reporting hits
        #[arg(short, long)]
        evalue: Option<f64>,

        /// Percent identity threshold for reporting hits
        #[arg(long)]
        per_identity: Option<f64>,

        /// Hits reported per query for each genome
        #[arg(long)]
        hits_per_genome: Option<usize>,

        /// Extension of gene files inside directories
        #[arg(short = 'x', long)]
        extension: Option<String>,

        /// Path to the diamond binary
        #[arg(long)]
        diamond: Option<PathBuf>,

        /// Also reduce the hit table to reciprocal best hits
        #[arg(long)]
        filter: bool,
    },

    /// Reduce a hit table to reciprocal best hits between genomes
    Filter {
        /// Tabular hit table produced by `rbh search`
        #[arg(long, required = true)]
        hits: PathBuf,

        /// Gene-to-genome map (defaults to gene_index.tsv beside the hit table)
        #[arg(long)]
        gene_index: Option<PathBuf>,

        /// Output file for reciprocal best hits
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Also write a per-genome-pair summary
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Show or write configuration
    Config {
        /// Print the default configuration instead of the effective one
        #[arg(long)]
        example: bool,

        /// Write the configuration to this file instead of stdout
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => print_error_and_exit(&CliError::config(format!("{:#}", e))),
    };

    match cli.command {
        Commands::Search {
            genes,
            out_dir,
            evalue,
            per_identity,
            hits_per_genome,
            extension,
            diamond,
            filter,
        } => {
            commands::search::execute(
                &config,
                cli.threads,
                cli.quiet,
                commands::search::SearchArgs {
                    genes,
                    out_dir,
                    evalue,
                    per_identity,
                    hits_per_genome,
                    extension,
                    diamond,
                    filter,
                },
            )?;
        }

        Commands::Filter { hits, gene_index, out, summary } => {
            commands::filter::execute(&config, hits, gene_index, out, summary)?;
        }

        Commands::Config { example, write } => {
            commands::config::execute(&config, example, write)?;
        }
    }

    Ok(())
}
