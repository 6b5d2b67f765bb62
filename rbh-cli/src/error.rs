//! Error handling for the rbh CLI

use thiserror::Error;
use std::path::PathBuf;
use rbh_core::SearchError;

/// Main error type for rbh CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("No gene files found: {message}")]
    NoInputs { message: String },

    #[error("External tool error: {tool} - {message}")]
    ExternalTool { tool: String, message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn no_inputs<S: Into<String>>(message: S) -> Self {
        Self::NoInputs { message: message.into() }
    }

    pub fn external_tool<S: Into<String>>(tool: S, message: S) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<SearchError> for CliError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::ToolNotFound { tool } => {
                Self::external_tool(tool, "not found on the system path".to_string())
            }
            SearchError::ToolFailed { tool, step, code, stderr } => Self::external_tool(
                tool,
                format!("{} exited with code {:?}: {}", step, code, stderr),
            ),
            SearchError::InvalidParams(message) => Self::validation(message),
            SearchError::Io(e) => Self::io(e.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the file path is correct: {}\n\
                 • Ensure you have read permissions for the file",
                path.display()
            ));
        }

        CliError::NoInputs { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Pass protein FASTA files or a directory containing them\n\
                 • Use --extension to match files that do not end in .faa"
            );
        }

        CliError::ExternalTool { tool, .. } => {
            if tool.ends_with("diamond") {
                message.push_str(
                    "\n\nSuggestions:\n\
                     • Install DIAMOND: https://github.com/bbuchfink/diamond\n\
                     • Or via bioconda: conda install -c bioconda diamond\n\
                     • Ensure diamond is in your PATH or set --diamond / [search] diamond"
                );
            } else {
                message.push_str(&format!(
                    "\n\nSuggestions:\n\
                     • Install {}\n\
                     • Ensure {} is in your PATH",
                    tool, tool
                ));
            }
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your rbh.toml configuration file\n\
                 • Use 'rbh config --example' to generate a sample configuration"
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}
