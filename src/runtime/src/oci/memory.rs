//! In-process blob store used as the staging area for a build.

use std::collections::HashMap;

use async_trait::async_trait;
use deckpack_core::error::{DeckError, Result};
use deckpack_core::Digest;
use parking_lot::RwLock;

use super::manifest::Descriptor;
use super::store::{BlobStore, PutOutcome};

/// Blob store held entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    blobs: RwLock<HashMap<Digest, Vec<u8>>>,
    tags: RwLock<HashMap<String, Descriptor>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct blobs held.
    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    /// Whether the store holds no blobs.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }

    /// Tags currently bound, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.tags.read().keys().cloned().collect();
        tags.sort();
        tags
    }

    #[cfg(test)]
    pub(crate) fn overwrite(&self, digest: &Digest, data: &[u8]) {
        self.blobs.write().insert(digest.clone(), data.to_vec());
    }
}

#[async_trait]
impl BlobStore for MemoryStore {
    fn location(&self) -> String {
        "memory".to_string()
    }

    async fn exists(&self, desc: &Descriptor) -> Result<bool> {
        Ok(self.blobs.read().contains_key(&desc.digest))
    }

    async fn put_if_absent(&self, media_type: &str, data: &[u8]) -> Result<PutOutcome> {
        let descriptor = Descriptor::for_bytes(media_type, data);
        let mut blobs = self.blobs.write();
        let written = if blobs.contains_key(&descriptor.digest) {
            false
        } else {
            blobs.insert(descriptor.digest.clone(), data.to_vec());
            true
        };
        Ok(PutOutcome {
            descriptor,
            written,
        })
    }

    async fn fetch(&self, desc: &Descriptor) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .get(&desc.digest)
            .cloned()
            .ok_or_else(|| DeckError::BlobNotFound(desc.digest.to_string()))
    }

    async fn tag(&self, desc: &Descriptor, tag: &str) -> Result<()> {
        if !self.blobs.read().contains_key(&desc.digest) {
            return Err(DeckError::BlobNotFound(desc.digest.to_string()));
        }
        self.tags.write().insert(tag.to_string(), desc.clone());
        Ok(())
    }

    async fn resolve(&self, tag: &str) -> Result<Descriptor> {
        self.tags
            .read()
            .get(tag)
            .cloned()
            .ok_or_else(|| DeckError::TagNotFound(tag.to_string()))
    }
}
