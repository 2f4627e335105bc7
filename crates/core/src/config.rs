//! Application configuration.
//!
//! Values are layered: built-in defaults, then `config.toml` under the user's
//! config directory, then `RAILBOOK_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::persistence::{BookingFile, TrailingBytes};

/// Directory name used under the platform config and data roots.
pub const APP_DIR: &str = "railbook";

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

const ENV_PREFIX: &str = "RAILBOOK";

const DEFAULT_CONFIG: &str = r#"# railbook configuration
#
# Every key is optional; commented values show the defaults.
# Environment variables override this file, e.g. RAILBOOK_STRICT_LOAD=true.

# Directory holding the bookings file.
# data_dir = "~/.local/share/railbook"

# Bookings file, relative to data_dir unless absolute.
# bookings_file = "bookings.dat"

# Directory that receives text tickets and QR placeholders.
# ticket_dir = "~/.local/share/railbook/tickets"

# Refuse to start when the bookings file ends in a partial record
# instead of dropping the partial record.
strict_load = false
"#;

/// Resolved settings for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the bookings file.
    pub data_dir: PathBuf,
    /// Bookings file name or absolute path.
    pub bookings_file: PathBuf,
    /// Where ticket artifacts are written.
    pub ticket_dir: PathBuf,
    /// Reject a bookings file with a partial trailing record.
    pub strict_load: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            ticket_dir: data_dir.join("tickets"),
            data_dir,
            bookings_file: PathBuf::from("bookings.dat"),
            strict_load: false,
        }
    }
}

impl AppConfig {
    /// Load from the default config file location and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load using `path` as the config file; a missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let defaults = Self::default();
        let settings = config::Config::builder()
            .set_default("data_dir", path_value(&defaults.data_dir))?
            .set_default("bookings_file", path_value(&defaults.bookings_file))?
            .set_default("ticket_dir", path_value(&defaults.ticket_dir))?
            .set_default("strict_load", defaults.strict_load)?
            .add_source(config::File::from(path).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))
    }

    /// Full path of the bookings file.
    pub fn bookings_path(&self) -> PathBuf {
        if self.bookings_file.is_absolute() {
            self.bookings_file.clone()
        } else {
            self.data_dir.join(&self.bookings_file)
        }
    }

    /// The bookings file with the configured load policy.
    pub fn booking_file(&self) -> BookingFile {
        let trailing = if self.strict_load {
            TrailingBytes::Reject
        } else {
            TrailingBytes::Discard
        };
        BookingFile::new(self.bookings_path()).with_trailing(trailing)
    }
}

/// Default location of the configuration file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE)
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    let path = config_path();
    write_default_config(&path)?;
    Ok(path)
}

fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "default configuration written");
    Ok(())
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn path_value(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
