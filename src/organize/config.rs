//! Configuration for organize runs.

use std::{fmt, fs};

use anyhow::Context;
use serde::Deserialize;

/// Config from the user config file.
#[derive(Debug, Default, Deserialize)]
pub struct TakeoutConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub dryrun: bool,
    #[serde(default)]
    pub skip_invalid: bool,
    #[serde(default)]
    pub verbose: bool,
}

/// Wrapper needed for parsing the config section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    takeout: TakeoutConfig,
}

/// Final config created from CLI arguments and user config file.
#[derive(Debug, Default, Clone)]
pub struct OrganizeConfig {
    pub debug: bool,
    /// Only print planned moves.
    pub dryrun: bool,
    /// Record unreadable sidecars as failures instead of aborting the run.
    pub skip_invalid: bool,
    pub verbose: bool,
}

impl TakeoutConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    pub fn get_user_config() -> anyhow::Result<Self> {
        let Some(path) = crate::config::config_path() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse config from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    pub fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.takeout)
            .context("Failed to parse takeout config TOML")
    }
}

impl fmt::Display for OrganizeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config:")?;
        writeln!(f, "  debug:        {}", crate::colorize_bool(self.debug))?;
        writeln!(f, "  dryrun:       {}", crate::colorize_bool(self.dryrun))?;
        writeln!(f, "  skip invalid: {}", crate::colorize_bool(self.skip_invalid))?;
        write!(f, "  verbose:      {}", crate::colorize_bool(self.verbose))
    }
}
