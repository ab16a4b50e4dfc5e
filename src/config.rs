//! Bridge configuration (`.numbridge.toml`)
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "json"
//!
//! [[function]]
//! name = "factorial"
//! params = ["i32"]
//! returns = "i64"
//!
//! [[function]]
//! name = "divide_checked"
//! params = ["i32", "i32"]
//! returns = "i32"
//! convention = "status"
//! ```
//!
//! An empty `function` list means "use the native library's own declarations".

use crate::declarations::{DeclarationTable, Signature};
use crate::error::BridgeError;
use crate::interop::{InterchangeType, ResultConvention};
use crate::logging::{LogConfig, LogFormat, LogOutput};
use crate::native;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;

pub const CONFIG_FILE_NAME: &str = ".numbridge.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid logging setting: {0}")]
    Logging(String),

    #[error("invalid declaration: {0}")]
    Declaration(#[from] BridgeError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub logging: LoggingSection,

    #[serde(default, rename = "function")]
    pub functions: Vec<FunctionDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default = "default_format")]
    pub format: String,

    /// Directory for daily-rotated log files; console (stderr) when absent
    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default)]
    pub span_events: bool,

    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,

    #[serde(default)]
    pub params: Vec<InterchangeType>,

    pub returns: InterchangeType,

    #[serde(default)]
    pub convention: ResultConvention,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            directory: None,
            span_events: false,
            filter: None,
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "compact".to_string()
}

impl FunctionDecl {
    pub fn to_signature(&self) -> Signature {
        match self.convention {
            ResultConvention::Direct => {
                Signature::new(self.name.clone(), self.params.clone(), self.returns)
            }
            ResultConvention::Status => {
                Signature::with_status(self.name.clone(), self.params.clone(), self.returns)
            }
        }
    }
}

impl LoggingSection {
    pub fn to_log_config(&self) -> Result<LogConfig, ConfigError> {
        let level = Level::from_str(&self.level)
            .map_err(|_| ConfigError::Logging(format!("unknown level '{}'", self.level)))?;
        let format = LogFormat::from_str(&self.format).map_err(ConfigError::Logging)?;

        let mut config = LogConfig::new()
            .with_level(level)
            .with_format(format)
            .with_span_events(self.span_events);

        if let Some(directory) = &self.directory {
            config = config.with_output(LogOutput::File {
                directory: directory.clone(),
                prefix: "numbridge".to_string(),
            });
        }
        if let Some(filter) = &self.filter {
            config = config.with_filter(filter.clone());
        }

        Ok(config)
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Find `.numbridge.toml` in `start` or its parents
    pub fn find(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    /// Find and load configuration from the current directory or its parents,
    /// falling back to defaults when none exists
    pub fn discover() -> Result<Self, ConfigError> {
        let found = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find(&dir));

        match found {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading bridge config");
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Build the declaration table this config describes
    pub fn declarations(&self) -> Result<DeclarationTable, ConfigError> {
        if self.functions.is_empty() {
            return Ok(native::declarations()?);
        }

        let mut table = DeclarationTable::new();
        for decl in &self.functions {
            table.declare(decl.to_signature())?;
        }
        Ok(table)
    }
}
