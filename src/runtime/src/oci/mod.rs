//! OCI packaging of card decks.
//!
//! A deck is stored as an OCI artifact: one manifest whose config blob lists
//! the card codes and whose layers are the card images.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  build   ┌─────────────┐  copy   ┌──────────────────┐
//! │ deck file +  │ ───────► │ MemoryStore │ ──────► │ LayoutStore      │
//! │ image dir    │          │ (staging)   │         │ RegistryStore    │
//! └──────────────┘          └─────────────┘         └──────────────────┘
//!                                                            │ load_deck
//!                                                            ▼
//!                                                     Deck { cards, images }
//! ```
//!
//! Every store implements [`BlobStore`]; the transfer engine and the reader
//! only ever see the trait.

pub mod builder;
pub mod layout;
pub mod manifest;
pub mod memory;
pub mod reader;
pub mod reference;
pub mod registry;
pub mod store;
pub mod target;
pub mod transfer;

pub use builder::{AssetResolver, BuiltDeck, DeckBuilder, DirectoryAssets};
pub use layout::LayoutStore;
pub use manifest::{Descriptor, ImageIndex, Manifest};
pub use memory::MemoryStore;
pub use reader::{load_deck, Deck};
pub use reference::RegistryReference;
pub use registry::{RegistryAuth, RegistryStore};
pub use store::{BlobStore, PutOutcome};
pub use target::StoreTarget;
pub use transfer::{
    copy, CopyOptions, SilentObserver, TransferEvent, TransferObserver, TransferReport,
};
