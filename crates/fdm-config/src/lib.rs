//! fdm-config: aircraft configuration file format, loading and validation.

pub mod schema;
pub mod validate;

use std::path::Path;

use fdm_core::FdmError;
use tracing::debug;

pub use schema::*;
pub use validate::{ValidationError, validate_aircraft};

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Source name used for documents that do not come from a file.
pub const INLINE_SOURCE: &str = "<inline>";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read '{file}': {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },

    #[error("YAML error in '{file}': {source}")]
    Yaml {
        file: String,
        source: serde_yaml::Error,
    },

    #[error("JSON error in '{file}': {source}")]
    Json {
        file: String,
        source: serde_json::Error,
    },

    #[error("Validation error in '{file}': {source}")]
    Validation {
        file: String,
        source: ValidationError,
    },

    #[error("Unsupported configuration format for '{file}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat { file: String },
}

impl ConfigError {
    pub fn file(&self) -> &str {
        match self {
            ConfigError::Io { file, .. }
            | ConfigError::Yaml { file, .. }
            | ConfigError::Json { file, .. }
            | ConfigError::Validation { file, .. }
            | ConfigError::UnsupportedFormat { file } => file,
        }
    }

    /// 1-based line and column of the failure, when the parser knows it.
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            ConfigError::Yaml { source, .. } => {
                source.location().map(|l| (l.line(), l.column()))
            }
            ConfigError::Json { source, .. } if source.line() > 0 => {
                Some((source.line(), source.column()))
            }
            _ => None,
        }
    }
}

impl From<ConfigError> for FdmError {
    fn from(err: ConfigError) -> Self {
        let (line, column) = match err.location() {
            Some((l, c)) => (Some(l), Some(c)),
            None => (None, None),
        };
        let what = match &err {
            ConfigError::Io { source, .. } => source.to_string(),
            ConfigError::Yaml { source, .. } => source.to_string(),
            ConfigError::Json { source, .. } => source.to_string(),
            ConfigError::Validation { source, .. } => source.to_string(),
            ConfigError::UnsupportedFormat { .. } => err.to_string(),
        };
        FdmError::FileReading {
            file: err.file().to_string(),
            what,
            line,
            column,
        }
    }
}

/// Parse and validate a YAML document.
pub fn from_yaml_str(content: &str, file: &str) -> ConfigResult<AircraftDef> {
    let def: AircraftDef = serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
        file: file.to_string(),
        source,
    })?;
    checked(def, file)
}

/// Parse and validate a JSON document.
pub fn from_json_str(content: &str, file: &str) -> ConfigResult<AircraftDef> {
    let def: AircraftDef = serde_json::from_str(content).map_err(|source| ConfigError::Json {
        file: file.to_string(),
        source,
    })?;
    checked(def, file)
}

fn checked(def: AircraftDef, file: &str) -> ConfigResult<AircraftDef> {
    validate_aircraft(&def).map_err(|source| ConfigError::Validation {
        file: file.to_string(),
        source,
    })?;
    debug!(
        file,
        aircraft = %def.name,
        engines = def.propulsion.engines.len(),
        wheels = def.landing_gear.wheels.len(),
        channels = def.controls.channels.len(),
        "aircraft configuration loaded"
    );
    Ok(def)
}

fn read(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        file: path.display().to_string(),
        source,
    })
}

pub fn load_yaml(path: &Path) -> ConfigResult<AircraftDef> {
    let content = read(path)?;
    from_yaml_str(&content, &path.display().to_string())
}

pub fn load_json(path: &Path) -> ConfigResult<AircraftDef> {
    let content = read(path)?;
    from_json_str(&content, &path.display().to_string())
}

/// Load by file extension.
pub fn load(path: &Path) -> ConfigResult<AircraftDef> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => load_yaml(path),
        Some("json") => load_json(path),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.display().to_string(),
        }),
    }
}

pub fn save_yaml(path: &Path, def: &AircraftDef) -> ConfigResult<()> {
    let file = path.display().to_string();
    validate_aircraft(def).map_err(|source| ConfigError::Validation {
        file: file.clone(),
        source,
    })?;
    let content = serde_yaml::to_string(def).map_err(|source| ConfigError::Yaml {
        file: file.clone(),
        source,
    })?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io { file, source })
}
