//! Content-addressed blob store abstraction.
//!
//! A store keeps blobs keyed by digest plus a mutable tag table mapping
//! names to manifest descriptors. Three backends implement it:
//!
//! - [`MemoryStore`](super::MemoryStore): process memory, used to stage a build
//! - [`LayoutStore`](super::LayoutStore): an OCI image layout directory
//! - [`RegistryStore`](super::RegistryStore): a distribution-API registry
//!
//! Reads go through [`BlobStore::get`], which re-hashes every payload
//! against the descriptor it was requested by. Backends only implement the
//! raw [`BlobStore::fetch`].

use async_trait::async_trait;
use deckpack_core::error::Result;

use super::manifest::Descriptor;

/// Result of [`BlobStore::put_if_absent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutcome {
    /// Descriptor of the stored content (no annotations).
    pub descriptor: Descriptor,
    /// False when the content was already present and nothing was written.
    pub written: bool,
}

/// Content-addressed storage for manifests and blobs.
///
/// Implementations must tolerate concurrent `put_if_absent` calls for the
/// same content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Human-readable location for logs and error messages.
    fn location(&self) -> String;

    /// Whether content with the descriptor's digest is present.
    async fn exists(&self, desc: &Descriptor) -> Result<bool>;

    /// Store `data` unless a blob with the same digest already exists.
    async fn put_if_absent(&self, media_type: &str, data: &[u8]) -> Result<PutOutcome>;

    /// Fetch raw bytes without integrity checking.
    ///
    /// Fails with `BlobNotFound` when the digest is absent.
    async fn fetch(&self, desc: &Descriptor) -> Result<Vec<u8>>;

    /// Bind `tag` to a manifest descriptor, replacing any previous binding.
    async fn tag(&self, desc: &Descriptor, tag: &str) -> Result<()>;

    /// Look up the manifest descriptor bound to `tag`.
    ///
    /// Fails with `TagNotFound` when the tag is unbound.
    async fn resolve(&self, tag: &str) -> Result<Descriptor>;

    /// Fetch bytes and verify them against the descriptor.
    ///
    /// Fails with `BlobCorrupted` when the stored bytes no longer hash to
    /// the requested digest.
    async fn get(&self, desc: &Descriptor) -> Result<Vec<u8>> {
        let data = self.fetch(desc).await?;
        desc.verify(&data)?;
        Ok(data)
    }
}
