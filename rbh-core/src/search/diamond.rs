//! DIAMOND wrapper
//!
//! Runs `diamond makedb` and `diamond blastp` as subprocesses. Nothing is parsed
//! from the tool's output here; the hit table is read back by `io::hits`.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use super::{ProteinSearchTool, SearchError, SearchParams, SearchResult};

/// DIAMOND protein aligner
#[derive(Debug, Clone)]
pub struct Diamond {
    binary_path: PathBuf,
}

impl Diamond {
    pub const BINARY: &'static str = "diamond";

    /// Resolve the DIAMOND binary and verify it can be executed.
    ///
    /// An explicit path is used as given; otherwise `diamond` is looked up on `PATH`.
    pub fn locate(binary_path: Option<PathBuf>) -> SearchResult<Self> {
        let binary_path = match binary_path {
            Some(path) => path,
            None => which::which(Self::BINARY).map_err(|_| SearchError::ToolNotFound {
                tool: Self::BINARY.to_string(),
            })?,
        };

        let diamond = Self::with_binary_path(binary_path);
        if !diamond.is_available() {
            return Err(SearchError::ToolNotFound {
                tool: diamond.binary_path.display().to_string(),
            });
        }

        log::debug!("Using diamond at {}", diamond.binary_path.display());
        Ok(diamond)
    }

    /// Create a wrapper around a binary path without checking it
    pub fn with_binary_path<P: Into<PathBuf>>(binary_path: P) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// The binary counts as present if it can be spawned at all; `-h` exit codes vary
    /// between releases.
    fn check_binary_available(&self) -> bool {
        Command::new(&self.binary_path)
            .arg("-h")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }

    /// Arguments for `diamond makedb`
    pub fn makedb_args(params: &SearchParams, fasta: &Path, db: &Path) -> Vec<String> {
        vec![
            "makedb".to_string(),
            "-p".to_string(),
            params.cpus.to_string(),
            "--in".to_string(),
            fasta.to_string_lossy().to_string(),
            "-d".to_string(),
            db.to_string_lossy().to_string(),
        ]
    }

    /// Arguments for `diamond blastp`
    pub fn blastp_args(params: &SearchParams, query: &Path, db: &Path, output: &Path) -> Vec<String> {
        vec![
            "blastp".to_string(),
            "--compress".to_string(),
            "0".to_string(),
            "-p".to_string(),
            params.cpus.to_string(),
            "-q".to_string(),
            query.to_string_lossy().to_string(),
            "-d".to_string(),
            db.to_string_lossy().to_string(),
            "-o".to_string(),
            output.to_string_lossy().to_string(),
            "-k".to_string(),
            params.max_target_seqs.to_string(),
            "-e".to_string(),
            format_general(params.evalue),
            "--id".to_string(),
            format!("{:.6}", params.per_identity),
        ]
    }

    fn run(&self, step: &str, args: Vec<String>) -> SearchResult<()> {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&args);

        log::info!("Running diamond: {:?}", cmd);

        let output = cmd.output().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SearchError::ToolNotFound {
                tool: self.binary_path.display().to_string(),
            },
            _ => SearchError::Io(e),
        })?;

        if !output.status.success() {
            return Err(SearchError::ToolFailed {
                tool: Self::BINARY.to_string(),
                step: step.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        log::trace!("diamond {} stderr: {}", step, String::from_utf8_lossy(&output.stderr));
        Ok(())
    }
}

impl ProteinSearchTool for Diamond {
    fn make_db(&self, params: &SearchParams, fasta: &Path, db: &Path) -> SearchResult<()> {
        self.run("makedb", Self::makedb_args(params, fasta, db))
    }

    fn blastp(
        &self,
        params: &SearchParams,
        query: &Path,
        db: &Path,
        output: &Path,
    ) -> SearchResult<()> {
        self.run("blastp", Self::blastp_args(params, query, db, output))
    }

    fn name(&self) -> &'static str {
        Self::BINARY
    }

    fn version(&self) -> String {
        Command::new(&self.binary_path)
            .arg("--version")
            .output()
            .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
            .unwrap_or_else(|_| "unknown".to_string())
    }

    fn is_available(&self) -> bool {
        self.check_binary_available()
    }
}

/// Render a float the way C's `%g` does: six significant digits, scientific notation
/// for exponents below -4 or from 6 upwards, trailing zeros removed.
pub fn format_general(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }

    let sci = format!("{:.5e}", value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return sci,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..6).contains(&exponent) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let decimals = (5 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
