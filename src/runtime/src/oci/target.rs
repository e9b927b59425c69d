//! Choosing a store from a command-line location.
//!
//! A location names either a local OCI layout directory or a registry
//! repository. Existing directories and explicit paths (`/…`, `./…`,
//! `../…`) are layouts; anything else must parse as a registry reference.

use std::path::{Path, PathBuf};

use deckpack_core::error::Result;

use super::layout::LayoutStore;
use super::reference::{RegistryReference, DEFAULT_TAG};
use super::registry::{RegistryAuth, RegistryStore};
use super::store::BlobStore;

/// Where a deck is read from or written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreTarget {
    /// OCI image layout directory.
    Layout(PathBuf),
    /// Repository in a remote registry.
    Registry(RegistryReference),
}

impl StoreTarget {
    /// Classify `location`.
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        let path = Path::new(location);
        if path.is_dir() || looks_like_path(location) {
            return Ok(StoreTarget::Layout(path.to_path_buf()));
        }
        RegistryReference::parse(location).map(StoreTarget::Registry)
    }

    /// The tag implied by the location: the reference tag, or `latest` for layouts.
    pub fn tag(&self) -> &str {
        match self {
            StoreTarget::Layout(_) => DEFAULT_TAG,
            StoreTarget::Registry(reference) => &reference.tag,
        }
    }

    /// What to resolve when reading: a pinned digest wins over the tag.
    pub fn read_reference(&self) -> String {
        match self {
            StoreTarget::Layout(_) => DEFAULT_TAG.to_string(),
            StoreTarget::Registry(reference) => reference.manifest_reference(),
        }
    }

    /// Open an existing store for reading.
    pub async fn open(&self, plain_http: bool) -> Result<Box<dyn BlobStore>> {
        match self {
            StoreTarget::Layout(root) => Ok(Box::new(LayoutStore::open(root).await?)),
            StoreTarget::Registry(reference) => Ok(Box::new(RegistryStore::with_auth(
                reference.clone(),
                plain_http,
                RegistryAuth::from_env(),
            )?)),
        }
    }

    /// Open a store for writing, creating a layout directory when needed.
    pub async fn open_for_write(&self, plain_http: bool) -> Result<Box<dyn BlobStore>> {
        match self {
            StoreTarget::Layout(root) => Ok(Box::new(LayoutStore::create(root).await?)),
            StoreTarget::Registry(_) => self.open(plain_http).await,
        }
    }
}

impl std::fmt::Display for StoreTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreTarget::Layout(root) => write!(f, "{}", root.display()),
            StoreTarget::Registry(reference) => write!(f, "{}", reference),
        }
    }
}

fn looks_like_path(location: &str) -> bool {
    location.starts_with('/')
        || location.starts_with("./")
        || location.starts_with("../")
        || location == "."
        || location == ".."
}
