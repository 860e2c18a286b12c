//! Provider credentials file.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::provider::ConsumerKeys;

/// Startup-fatal configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("config file {path} is missing `{field}`")]
    Missing { path: PathBuf, field: &'static str },
}

/// On-disk shape of the credentials file.
#[derive(Debug, Clone, Deserialize)]
struct ProviderFile {
    #[serde(default)]
    twitter_api_key: String,
    #[serde(default)]
    twitter_api_secret: String,
}

/// Load the application consumer keys from a JSON file:
///
/// ```json
/// { "twitter_api_key": "...", "twitter_api_secret": "..." }
/// ```
pub fn load_consumer_keys(path: impl AsRef<Path>) -> Result<ConsumerKeys, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_consumer_keys(path, &raw)
}

fn parse_consumer_keys(path: &Path, raw: &str) -> Result<ConsumerKeys, ConfigError> {
    let file: ProviderFile = serde_json::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if file.twitter_api_key.is_empty() {
        return Err(ConfigError::Missing {
            path: path.to_path_buf(),
            field: "twitter_api_key",
        });
    }
    if file.twitter_api_secret.is_empty() {
        return Err(ConfigError::Missing {
            path: path.to_path_buf(),
            field: "twitter_api_secret",
        });
    }

    Ok(ConsumerKeys {
        key: file.twitter_api_key,
        secret: file.twitter_api_secret,
    })
}
