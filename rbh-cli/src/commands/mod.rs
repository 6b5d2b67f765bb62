//! Command implementations for the rbh CLI

pub mod search;
pub mod filter;
pub mod config;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while an external step runs; hidden in quiet mode
pub fn spinner(quiet: bool, message: String) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}
