//! OCI descriptor, manifest and index documents.
//!
//! Only the fields deckpack reads or writes are modelled. Annotation maps
//! are ordered so that serializing the same document twice yields the
//! same bytes, and therefore the same digest.

use std::collections::BTreeMap;

use deckpack_core::error::{DeckError, Result};
use deckpack_core::Digest;
use serde::{Deserialize, Serialize};

/// OCI image manifest media type.
pub const MANIFEST_MEDIA_TYPE: &str = "application/vnd.oci.image.manifest.v1+json";

/// OCI image index media type.
pub const INDEX_MEDIA_TYPE: &str = "application/vnd.oci.image.index.v1+json";

/// Artifact type of a card deck manifest.
pub const ARTIFACT_TYPE: &str = "application/vnd.card-deck";

/// Media type of the deck config blob (JSON array of card codes).
pub const CONFIG_MEDIA_TYPE: &str = "application/vnd.card-deck.config+json";

/// Media type of card image layers.
pub const CARD_MEDIA_TYPE: &str = "image/png";

/// Filename of the content a descriptor points at.
pub const ANNOTATION_TITLE: &str = "org.opencontainers.image.title";

/// Card code a layer was built from.
pub const ANNOTATION_CARD: &str = "vnd.card-deck.card";

/// Tag name of an `index.json` entry in an OCI layout.
pub const ANNOTATION_REF_NAME: &str = "org.opencontainers.image.ref.name";

/// Reference to a blob: what it is, where it is, how big it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    pub digest: Digest,
    pub size: u64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Descriptor {
    /// Describe a payload without storing it.
    pub fn for_bytes(media_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            media_type: media_type.into(),
            digest: Digest::of(data),
            size: data.len() as u64,
            annotations: BTreeMap::new(),
        }
    }

    /// Add an annotation, replacing any previous value for `key`.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Look up an annotation value.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.annotations.get(key).map(|s| s.as_str())
    }

    /// The `org.opencontainers.image.title` annotation, if present and non-empty.
    pub fn title(&self) -> Option<&str> {
        self.annotation(ANNOTATION_TITLE).filter(|t| !t.is_empty())
    }

    /// Check fetched bytes against this descriptor's digest and size.
    pub fn verify(&self, data: &[u8]) -> Result<()> {
        self.digest.verify(data)?;
        if data.len() as u64 != self.size {
            return Err(DeckError::BlobCorrupted {
                expected: format!("{} ({} bytes)", self.digest, self.size),
                actual: format!("{} ({} bytes)", self.digest, data.len()),
            });
        }
        Ok(())
    }

    /// Whether this descriptor points at an image manifest.
    pub fn is_manifest(&self) -> bool {
        self.media_type == MANIFEST_MEDIA_TYPE
    }
}

/// OCI image manifest (v1.1 artifact form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Descriptor>,
    #[serde(default)]
    pub layers: Vec<Descriptor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Manifest {
    /// Create a manifest for an artifact.
    pub fn new(
        artifact_type: impl Into<String>,
        config: Option<Descriptor>,
        layers: Vec<Descriptor>,
    ) -> Self {
        Self {
            schema_version: 2,
            media_type: Some(MANIFEST_MEDIA_TYPE.to_string()),
            artifact_type: Some(artifact_type.into()),
            config,
            layers,
            annotations: BTreeMap::new(),
        }
    }

    /// Serialize to the canonical JSON bytes that get stored and hashed.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode stored manifest bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let manifest: Manifest = serde_json::from_slice(data)
            .map_err(|e| DeckError::ManifestDecodeError(e.to_string()))?;
        if manifest.schema_version != 2 {
            return Err(DeckError::ManifestDecodeError(format!(
                "unsupported schemaVersion {}",
                manifest.schema_version
            )));
        }
        Ok(manifest)
    }

    /// Every blob the manifest references: the config first, then the layers
    /// in order.
    pub fn references(&self) -> impl Iterator<Item = &Descriptor> {
        self.config.iter().chain(self.layers.iter())
    }
}

/// `index.json` of an OCI layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageIndex {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub manifests: Vec<Descriptor>,
}

impl Default for ImageIndex {
    fn default() -> Self {
        Self {
            schema_version: 2,
            media_type: Some(INDEX_MEDIA_TYPE.to_string()),
            manifests: Vec::new(),
        }
    }
}

impl ImageIndex {
    /// Find the manifest entry tagged `tag`.
    pub fn find_tag(&self, tag: &str) -> Option<&Descriptor> {
        self.manifests
            .iter()
            .find(|d| d.annotation(ANNOTATION_REF_NAME) == Some(tag))
    }

    /// Bind `tag` to `manifest`, dropping any entry previously holding the tag.
    pub fn set_tag(&mut self, manifest: &Descriptor, tag: &str) {
        self.manifests
            .retain(|d| d.annotation(ANNOTATION_REF_NAME) != Some(tag));

        let mut entry = manifest.clone();
        entry.annotations.clear();
        self.manifests
            .push(entry.with_annotation(ANNOTATION_REF_NAME, tag));
    }
}
