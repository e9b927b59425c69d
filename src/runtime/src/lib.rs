//! Deckpack runtime - building, moving and reading card deck artifacts.
//!
//! This crate holds the storage backends (memory, OCI layout, registry),
//! the artifact builder, the transfer engine and the verifying reader.

#![allow(clippy::result_large_err)]

pub mod oci;

// Re-export common types
pub use oci::{copy, load_deck, CopyOptions, Deck, TransferEvent, TransferObserver, TransferReport};
pub use oci::{AssetResolver, BuiltDeck, DeckBuilder, DirectoryAssets};
pub use oci::{BlobStore, LayoutStore, MemoryStore, RegistryAuth, RegistryStore, StoreTarget};
pub use oci::{Descriptor, Manifest, RegistryReference};

/// Deckpack runtime version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
