//! Config command implementation - print or write configuration files

use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;

pub fn execute(config: &Config, example: bool, write: Option<PathBuf>) -> Result<()> {
    let effective = if example { Config::default() } else { config.clone() };

    match write {
        Some(path) => {
            effective.save_to_file(&path)?;
            log::info!("Wrote configuration to {}", path.display());
        }
        None => {
            let text = if example {
                Config::example_toml()?
            } else {
                toml::to_string_pretty(&effective)?
            };
            print!("{}", text);
        }
    }

    Ok(())
}
