//! Configuration file support for waslist.
//!
//! Loads settings from `~/.config/waslist/config.toml` on Linux
//! (or platform-appropriate location on other OSes). Command-line flags
//! override anything set here.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::filter::CallsignList;

/// Default US state reference file.
pub const DEFAULT_STATES_FILE: &str = "usa_states.txt";

/// Default Canadian province reference file.
pub const DEFAULT_PROVINCES_FILE: &str = "ve_provinces.txt";

/// Application configuration loaded from TOML file.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Station callsigns to use when `--call` is not given.
    pub callsigns: CallsignList,

    /// Tab-separated US state list.
    pub states_file: PathBuf,

    /// Tab-separated Canadian province list (code and name).
    pub provinces_file: PathBuf,

    /// Directory the CSV and map files are written to.
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            callsigns: CallsignList::default(),
            states_file: PathBuf::from(DEFAULT_STATES_FILE),
            provinces_file: PathBuf::from(DEFAULT_PROVINCES_FILE),
            output_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Load configuration from the default config file location.
    ///
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid TOML in config file: {}", path.display()))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("waslist/config.toml"))
    }

    /// Validate all configuration settings.
    pub fn validate(&self) -> Result<()> {
        for call in self.callsigns.calls() {
            if call.chars().any(char::is_whitespace) {
                anyhow::bail!("Invalid callsign {:?}: contains whitespace", call);
            }
        }
        if self.states_file.as_os_str().is_empty() {
            anyhow::bail!("states_file must not be empty");
        }
        Ok(())
    }
}
