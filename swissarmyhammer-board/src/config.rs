//! Configuration for a board session, loaded with figment.
//!
//! Sources, later overriding earlier:
//! 1. Built-in defaults
//! 2. `board.toml` / `board.yaml` in the config directory
//! 3. Environment variables prefixed `BOARD_` (e.g. `BOARD_TEMPLATE=empty`)
//!
//! Command line flags are applied on top by the host.

use crate::error::{BoardError, Result};
use crate::types::Template;
use figment::{
    providers::{Env, Format, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "BOARD_";

/// Config file stem searched for in the config directory
pub const CONFIG_FILE_STEM: &str = "board";

/// Settings for opening and syncing one board document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Path of the JSON document
    pub document: PathBuf,
    /// Layout used when the document doesn't exist yet
    pub template: Template,
    /// Default log filter when RUST_LOG isn't set
    pub log_level: String,
    /// Watch the document for external edits
    pub watch: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            document: PathBuf::from("board.json"),
            template: Template::Default,
            log_level: "info".to_string(),
            watch: true,
        }
    }
}

impl BoardConfig {
    /// Load from the current directory
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Load with config files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let config: Self = Self::figment(dir).extract().map_err(|e| BoardError::Config {
            message: e.to_string(),
        })?;
        debug!(?config, "loaded board config");
        Ok(config)
    }

    /// The layered figment, exposed so hosts can merge their own providers
    pub fn figment(dir: &Path) -> Figment {
        let file = |ext: &str| dir.join(format!("{CONFIG_FILE_STEM}.{ext}"));

        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(file("toml")))
            .merge(Yaml::file(file("yaml")))
            .merge(Env::prefixed(ENV_PREFIX))
    }
}
