//! Card deck artifact builder.
//!
//! Turns an ordered list of card codes into a tagged OCI artifact staged in
//! a [`MemoryStore`]:
//!
//! - one `image/png` layer per input code, in input order, annotated with
//!   the image filename and the normalized card code
//! - a config blob holding the normalized codes as a JSON array
//! - a manifest referencing both, tagged with the requested tag
//!
//! Repeated codes produce repeated layer entries. Their bytes are stored
//! once because the store is content-addressed.

use std::path::{Path, PathBuf};

use deckpack_core::error::{DeckError, Result};
use deckpack_core::Card;

use super::manifest::{
    Descriptor, Manifest, ANNOTATION_CARD, ANNOTATION_TITLE, ARTIFACT_TYPE, CARD_MEDIA_TYPE,
    CONFIG_MEDIA_TYPE, MANIFEST_MEDIA_TYPE,
};
use super::memory::MemoryStore;
use super::store::BlobStore;

/// Source of card image bytes, keyed by image filename.
pub trait AssetResolver: Send + Sync {
    /// Load the image named `filename`.
    ///
    /// Fails with `AssetNotFound` when there is no such image.
    fn load(&self, filename: &str) -> Result<Vec<u8>>;
}

/// Card images read from a directory.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetResolver for DirectoryAssets {
    fn load(&self, filename: &str) -> Result<Vec<u8>> {
        let path = self.root.join(filename);
        std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DeckError::AssetNotFound {
                filename: filename.to_string(),
                path: path.display().to_string(),
            },
            _ => DeckError::Other(format!(
                "Failed to read card image {}: {}",
                path.display(),
                e
            )),
        })
    }
}

/// A freshly built artifact and the staging store holding its blobs.
pub struct BuiltDeck {
    /// Staging store; holds every blob and the tag.
    pub store: MemoryStore,
    /// The assembled manifest.
    pub manifest: Manifest,
    /// Descriptor of the stored manifest bytes.
    pub descriptor: Descriptor,
    /// Tag bound to the manifest in `store`.
    pub tag: String,
    /// Normalized card codes, in input order.
    pub cards: Vec<String>,
}

/// Builds card deck artifacts from an asset source.
pub struct DeckBuilder<'a> {
    assets: &'a dyn AssetResolver,
}

impl<'a> DeckBuilder<'a> {
    pub fn new(assets: &'a dyn AssetResolver) -> Self {
        Self { assets }
    }

    /// Build the artifact for `codes` and tag it `tag` in a new memory store.
    ///
    /// Stops at the first invalid code or missing image; nothing is returned
    /// in that case.
    pub async fn build(&self, codes: &[String], tag: &str) -> Result<BuiltDeck> {
        let store = MemoryStore::new();
        let mut layers = Vec::with_capacity(codes.len());
        let mut cards = Vec::with_capacity(codes.len());

        for code in codes {
            let card = Card::parse(code)?;
            let filename = card.filename();
            let data = self.assets.load(&filename)?;

            let outcome = store.put_if_absent(CARD_MEDIA_TYPE, &data).await?;
            tracing::debug!(
                card = %card,
                filename = %filename,
                size = data.len(),
                new = outcome.written,
                "Prepared card layer"
            );

            layers.push(
                outcome
                    .descriptor
                    .with_annotation(ANNOTATION_TITLE, filename)
                    .with_annotation(ANNOTATION_CARD, card.code()),
            );
            cards.push(card.code());
        }

        if cards.is_empty() {
            tracing::warn!("Building a deck with no cards");
        }

        let config_bytes = serde_json::to_vec(&cards)?;
        let config = store
            .put_if_absent(CONFIG_MEDIA_TYPE, &config_bytes)
            .await?
            .descriptor;

        let manifest = Manifest::new(ARTIFACT_TYPE, Some(config), layers);
        let manifest_bytes = manifest.to_bytes()?;
        let descriptor = store
            .put_if_absent(MANIFEST_MEDIA_TYPE, &manifest_bytes)
            .await?
            .descriptor;
        store.tag(&descriptor, tag).await?;

        tracing::info!(
            cards = cards.len(),
            blobs = store.len(),
            digest = %descriptor.digest,
            tag,
            "Built deck artifact"
        );

        Ok(BuiltDeck {
            store,
            manifest,
            descriptor,
            tag: tag.to_string(),
            cards,
        })
    }
}
