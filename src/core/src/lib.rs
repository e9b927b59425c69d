//! Deckpack Core - Foundational Types
//!
//! Error taxonomy, content addressing, the card catalog, deck definition
//! parsing and configuration shared by the deckpack crates.

pub mod catalog;
pub mod config;
pub mod deck;
pub mod digest;
pub mod error;

// Re-export commonly used types
pub use catalog::Card;
pub use config::{DeckpackConfig, LogLevel};
pub use digest::Digest;
pub use error::{DeckError, Result};

/// Deckpack version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
