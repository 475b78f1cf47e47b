//! Workspace configuration.
//!
//! Loadable from a TOML file or from the environment (a local `.env` file is
//! honoured via dotenvy). Every field has a serde default so a partial config
//! file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScholiaError};
use crate::validation::ValidationLevel;

/// Complete Scholia configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScholiaConfig {
    /// Root directory holding document stores.
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,

    /// External reference parser settings.
    #[serde(default)]
    pub reference_parser: ReferenceParserConfig,

    /// Validation strictness applied before consolidation.
    #[serde(default)]
    pub validation: ValidationLevel,
}

impl Default for ScholiaConfig {
    fn default() -> Self {
        Self {
            store_root: default_store_root(),
            reference_parser: ReferenceParserConfig::default(),
            validation: ValidationLevel::default(),
        }
    }
}

fn default_store_root() -> PathBuf {
    PathBuf::from("stores")
}

/// Settings for the external bibliographic parser subprocess.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceParserConfig {
    /// Command invoked as `<command> parse <file>`.
    #[serde(default = "default_parser_command")]
    pub command: String,
}

impl Default for ReferenceParserConfig {
    fn default() -> Self {
        Self {
            command: default_parser_command(),
        }
    }
}

fn default_parser_command() -> String {
    "anystyle".to_string()
}

impl ScholiaConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw).map_err(|e| ScholiaError::Config(e.to_string()))
    }

    /// Load configuration from the environment, honouring a local `.env`.
    ///
    /// Recognised variables: `SCHOLIA_STORE_ROOT`, `SCHOLIA_REFPARSER_CMD`,
    /// `SCHOLIA_VALIDATION` ("basic" | "strict").
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        if let Ok(root) = std::env::var("SCHOLIA_STORE_ROOT") {
            config.store_root = PathBuf::from(root);
        }
        if let Ok(cmd) = std::env::var("SCHOLIA_REFPARSER_CMD") {
            config.reference_parser.command = cmd;
        }
        if let Ok(level) = std::env::var("SCHOLIA_VALIDATION") {
            if level.eq_ignore_ascii_case("strict") {
                config.validation = ValidationLevel::Strict;
            }
        }
        config
    }

    /// Path of the store directory for a named store.
    pub fn store_path(&self, name: &str) -> PathBuf {
        self.store_root.join(name)
    }
}
