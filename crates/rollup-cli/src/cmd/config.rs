use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use rollup_core::config::{Config, WarnLevel};

use super::Globals;
use crate::output::print_json;

const DEFAULT_CONFIG_FILE: &str = "rollup.yaml";

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration (file, defaults, and flags merged)
    Show,

    /// Validate the config for common mistakes
    Validate,

    /// Write a default config file
    Init {
        /// Where to write it (default: --config, or ./rollup.yaml)
        path: Option<PathBuf>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(globals: &Globals, subcmd: ConfigSubcommand) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(globals),
        ConfigSubcommand::Validate => validate(globals),
        ConfigSubcommand::Init { path } => {
            let path = path
                .or_else(|| globals.config.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            init(&path, globals.json)
        }
    }
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(globals: &Globals) -> anyhow::Result<()> {
    let config = globals.load_config()?;
    if globals.json {
        return print_json(&config);
    }
    print!("{}", serde_yaml::to_string(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(globals: &Globals) -> anyhow::Result<()> {
    let config = globals.load_config()?;
    let warnings = config.validate();

    if globals.json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    let has_errors = warnings.iter().any(|w| w.level == WarnLevel::Error);
    if has_errors {
        anyhow::bail!("config validation found errors");
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

fn init(path: &Path, json: bool) -> anyhow::Result<()> {
    let data = serde_yaml::to_string(&Config::default())?;
    let written = rollup_core::io::write_if_missing(path, data.as_bytes())
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        return print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "created": written,
        }));
    }
    if written {
        println!("Wrote {}", path.display());
    } else {
        println!("{} already exists; left unchanged", path.display());
    }
    Ok(())
}
