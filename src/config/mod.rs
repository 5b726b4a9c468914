use serde::{de::DeserializeOwned, Serialize};
use serde_json;
use std::{fs::File, io::BufReader, path::PathBuf, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
    #[error("Invalid path: {path:?}")]
    InvalidPath { path: String },
    #[error("File doesn't exist: {path:?}")]
    FileDoesntExist { path: PathBuf },
    #[error("Invalid pubkey for {field}: {value}")]
    InvalidPubkey { field: &'static str, value: String },
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Defines shared functionality for structs that should persist on the filesystem inside the config directory.
pub trait PersistentConfig: DeserializeOwned + Serialize {
    /// Load from the given path.
    fn load(path: &str) -> Result<Self, ConfigError> {
        let path = match PathBuf::from_str(path) {
            Ok(p) => p,
            Err(_e) => {
                return Err(ConfigError::InvalidPath {
                    path: path.to_string(),
                })
            }
        };

        if path.exists() {
            log::info!(
                "Attempting to load persistent data from: {}",
                path.display()
            );
            let file = File::open(&path)?;

            Ok(serde_json::from_reader(BufReader::new(file))?)
        } else {
            Err(ConfigError::FileDoesntExist { path })
        }
    }
}
