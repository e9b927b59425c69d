//! Reading a deck back out of a store.

use std::collections::{HashMap, HashSet};

use deckpack_core::error::{DeckError, Result};
use deckpack_core::Digest;

use super::manifest::{Manifest, ANNOTATION_CARD, ARTIFACT_TYPE, CARD_MEDIA_TYPE};
use super::store::BlobStore;

/// A verified deck: the card list and the image bytes keyed by filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    /// Card codes in deck order.
    pub cards: Vec<String>,
    /// Image bytes keyed by image filename.
    pub images: HashMap<String, Vec<u8>>,
}

impl Deck {
    pub fn image(&self, filename: &str) -> Option<&[u8]> {
        self.images.get(filename).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Image filenames, sorted.
    pub fn filenames(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.images.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Load and verify the deck tagged `tag` in `store`.
///
/// Every blob read is checked against its descriptor; a mismatch fails with
/// `BlobCorrupted`. Layers that are not `image/png` or carry no title are
/// skipped.
pub async fn load_deck(store: &dyn BlobStore, tag: &str) -> Result<Deck> {
    let manifest_desc = store.resolve(tag).await?;
    let manifest = Manifest::from_bytes(&store.get(&manifest_desc).await?)?;

    if manifest.artifact_type.as_deref() != Some(ARTIFACT_TYPE) {
        tracing::warn!(
            artifact_type = ?manifest.artifact_type,
            tag,
            "Manifest does not declare the card deck artifact type"
        );
    }

    let cards = match &manifest.config {
        Some(config) => {
            let data = store.get(config).await?;
            serde_json::from_slice::<Vec<String>>(&data).map_err(|e| {
                DeckError::ConfigDecodeError(format!("config {}: {}", config.digest, e))
            })?
        }
        None => manifest
            .layers
            .iter()
            .filter_map(|l| l.annotation(ANNOTATION_CARD).map(str::to_string))
            .collect(),
    };

    let mut images = HashMap::new();
    let mut verified: HashSet<Digest> = HashSet::new();
    for layer in &manifest.layers {
        if layer.media_type != CARD_MEDIA_TYPE {
            tracing::warn!(
                digest = %layer.digest,
                media_type = %layer.media_type,
                "Skipping layer with unexpected media type"
            );
            continue;
        }
        let Some(title) = layer.title() else {
            tracing::warn!(digest = %layer.digest, "Skipping layer without a title");
            continue;
        };
        // Every distinct blob is fetched and verified, whatever its title.
        if verified.contains(&layer.digest) {
            continue;
        }
        let data = store.get(layer).await?;
        verified.insert(layer.digest.clone());
        images.entry(title.to_string()).or_insert(data);
    }

    tracing::debug!(
        tag,
        digest = %manifest_desc.digest,
        cards = cards.len(),
        images = images.len(),
        "Loaded deck"
    );

    Ok(Deck { cards, images })
}
