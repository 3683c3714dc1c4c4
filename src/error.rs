use std::path::PathBuf;

use thiserror::Error;

use crate::domain::error::DomainError;
use crate::domain::TokenId;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Token catalog errors.
///
/// Every variant is fatal to catalog construction: a catalog is either
/// fully consistent or not built at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("token id cannot be empty")]
    EmptyTokenId,

    #[error("token {token_id} is defined more than once")]
    DuplicateToken { token_id: TokenId },

    #[error("native key {key} maps to both {first} and {second}")]
    DuplicateKey {
        key: String,
        first: TokenId,
        second: TokenId,
    },

    #[error("token {token_id} references unknown asset group '{group}'")]
    UnknownGroup { token_id: TokenId, group: String },

    #[error("asset group '{group}' is defined more than once")]
    DuplicateGroup { group: String },

    #[error("asset group '{group}' has unknown base token {base}")]
    UnknownGroupBase { group: String, base: TokenId },
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no source returned data")]
    NoData,
}

pub type Result<T> = std::result::Result<T, Error>;
