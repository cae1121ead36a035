use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while assembling the scene from its inputs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// A required named object was absent from the loaded scene file.
    #[error("missing asset: {0}")]
    MissingAsset(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Colours are written as `#rrggbb`.
    #[error("invalid color {0:?}, expected #rrggbb")]
    InvalidColor(String),
}
