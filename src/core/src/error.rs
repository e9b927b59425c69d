use thiserror::Error;

/// Deckpack error types
#[derive(Error, Debug)]
pub enum DeckError {
    /// Card code could not be mapped to a rank and suit
    #[error("Invalid card code {code:?}: {reason}")]
    InvalidCardCode { code: String, reason: String },

    /// Card image missing from the asset directory
    #[error("Asset not found: {filename} ({path})")]
    AssetNotFound { filename: String, path: String },

    /// Deck definition file could not be read
    #[error("Deck file error: {path} - {message}")]
    DeckFileError { path: String, message: String },

    /// No blob stored under the requested digest
    #[error("Blob not found: {0}")]
    BlobNotFound(String),

    /// Tag is not bound in the store
    #[error("Tag not found: {0}")]
    TagNotFound(String),

    /// Stored manifest is not valid JSON of the expected shape
    #[error("Manifest decode error: {0}")]
    ManifestDecodeError(String),

    /// Stored deck config is not a JSON array of card codes
    #[error("Config decode error: {0}")]
    ConfigDecodeError(String),

    /// Fetched bytes do not match the digest they were requested by
    #[error("Blob corrupted: expected {expected}, got {actual}")]
    BlobCorrupted { expected: String, actual: String },

    /// Copy between stores failed
    #[error("Transfer failed for {digest}: {message}")]
    TransferFailed { digest: String, message: String },

    /// Container registry error
    #[error("Registry error: {registry} - {message}")]
    RegistryError { registry: String, message: String },

    /// Malformed registry reference or digest
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DeckError {
    /// Whether this error means stored content failed an integrity check.
    pub fn is_integrity_violation(&self) -> bool {
        matches!(self, DeckError::BlobCorrupted { .. })
    }
}

impl From<serde_json::Error> for DeckError {
    fn from(err: serde_json::Error) -> Self {
        DeckError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for DeckError {
    fn from(err: serde_yaml::Error) -> Self {
        DeckError::SerializationError(err.to_string())
    }
}

/// Result type alias for deckpack operations
pub type Result<T> = std::result::Result<T, DeckError>;
