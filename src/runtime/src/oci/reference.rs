//! Registry reference parsing.
//!
//! Parses references like `localhost:5000/deck:v1` into structured components.

use deckpack_core::error::{DeckError, Result};
use deckpack_core::Digest;

/// Default tag when none is specified.
pub const DEFAULT_TAG: &str = "latest";

/// Parsed registry reference: `<host>[:<port>]/<path>[:<tag>][@<digest>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryReference {
    /// Registry host with optional port (e.g., "localhost:5000", "ghcr.io")
    pub registry: String,
    /// Repository path (e.g., "deck", "org/decks/poker")
    pub repository: String,
    /// Tag, `latest` when omitted
    pub tag: String,
    /// Optional pinned manifest digest
    pub digest: Option<Digest>,
}

impl RegistryReference {
    /// Parse a reference string.
    ///
    /// Supports formats:
    /// - `localhost:5000/deck` → tag `latest`
    /// - `localhost:5000/deck:v1`
    /// - `ghcr.io/org/sub/deck:v2`
    /// - `ghcr.io/org/deck@sha256:…` → tag `latest`, digest pinned
    pub fn parse(reference: &str) -> Result<Self> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(DeckError::InvalidReference(
                "Empty registry reference".to_string(),
            ));
        }

        // Split off digest first (@ separator)
        let (name_tag, digest) = match reference.rsplit_once('@') {
            Some((name_tag, digest)) => (name_tag, Some(digest.parse::<Digest>()?)),
            None => (reference, None),
        };

        // The registry host is everything before the first slash
        let (registry, path) = name_tag.split_once('/').ok_or_else(|| {
            DeckError::InvalidReference(format!(
                "Reference '{}' has no registry host (expected <host>/<path>)",
                reference
            ))
        })?;
        if registry.is_empty() {
            return Err(DeckError::InvalidReference(format!(
                "Empty registry host in reference '{}'",
                reference
            )));
        }

        // Tag is a colon in the last path component
        let (repository, tag) = match path.rsplit_once('/') {
            Some((_, last)) => match last.rsplit_once(':') {
                Some((_, tag)) => (&path[..path.len() - tag.len() - 1], Some(tag)),
                None => (path, None),
            },
            None => match path.rsplit_once(':') {
                Some((repo, tag)) => (repo, Some(tag)),
                None => (path, None),
            },
        };

        if repository.is_empty() || repository.split('/').any(str::is_empty) {
            return Err(DeckError::InvalidReference(format!(
                "Invalid repository path in reference '{}'",
                reference
            )));
        }
        if tag == Some("") {
            return Err(DeckError::InvalidReference(format!(
                "Empty tag in reference '{}'",
                reference
            )));
        }

        Ok(RegistryReference {
            registry: registry.to_string(),
            repository: repository.to_string(),
            tag: tag.unwrap_or(DEFAULT_TAG).to_string(),
            digest,
        })
    }

    /// The manifest reference to resolve: the pinned digest if any, else the tag.
    pub fn manifest_reference(&self) -> String {
        match &self.digest {
            Some(digest) => digest.to_string(),
            None => self.tag.clone(),
        }
    }

    /// Get the full reference string.
    pub fn full_reference(&self) -> String {
        let mut s = format!("{}/{}:{}", self.registry, self.repository, self.tag);
        if let Some(ref digest) = self.digest {
            s.push('@');
            s.push_str(&digest.to_string());
        }
        s
    }
}

impl std::fmt::Display for RegistryReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full_reference())
    }
}
