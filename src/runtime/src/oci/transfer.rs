//! Copying a tagged deck between blob stores.
//!
//! Every blob the manifest references is checked against the destination
//! first and only sent when missing. Blobs are visited config first, then
//! layers in manifest order, each distinct digest once. The manifest goes
//! last and the destination tag is bound only after every blob landed, so a
//! failed copy never leaves the tag pointing at a partial artifact.

use deckpack_core::error::{DeckError, Result};
use futures::stream::{self, StreamExt};

use super::manifest::{Descriptor, Manifest};
use super::store::BlobStore;

/// Default number of blobs transferred at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Per-blob outcome reported while a copy is in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// The blob was missing at the destination and has been sent.
    Uploaded(Descriptor),
    /// The destination already held the blob.
    Skipped(Descriptor),
}

impl TransferEvent {
    pub fn descriptor(&self) -> &Descriptor {
        match self {
            TransferEvent::Uploaded(desc) | TransferEvent::Skipped(desc) => desc,
        }
    }

    pub fn is_upload(&self) -> bool {
        matches!(self, TransferEvent::Uploaded(_))
    }
}

/// Receives transfer events, in manifest order.
pub trait TransferObserver: Send + Sync {
    fn on_event(&self, event: &TransferEvent);
}

impl<F> TransferObserver for F
where
    F: Fn(&TransferEvent) + Send + Sync,
{
    fn on_event(&self, event: &TransferEvent) {
        self(event)
    }
}

/// Observer that ignores every event.
pub struct SilentObserver;

impl TransferObserver for SilentObserver {
    fn on_event(&self, _event: &TransferEvent) {}
}

/// Options for [`copy`].
#[derive(Debug, Clone)]
pub struct CopyOptions {
    /// Upper bound on blobs in flight. Zero is treated as one.
    pub concurrency: usize,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

/// Result of a completed copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    /// Descriptor of the copied manifest, now tagged at the destination.
    pub manifest: Descriptor,
    /// Blobs sent to the destination, manifest included when it was sent.
    pub uploaded: Vec<Descriptor>,
    /// Blobs the destination already held.
    pub skipped: Vec<Descriptor>,
}

impl TransferReport {
    /// Total bytes sent.
    pub fn bytes_uploaded(&self) -> u64 {
        self.uploaded.iter().map(|d| d.size).sum()
    }

    fn record(&mut self, event: &TransferEvent) {
        match event {
            TransferEvent::Uploaded(desc) => self.uploaded.push(desc.clone()),
            TransferEvent::Skipped(desc) => self.skipped.push(desc.clone()),
        }
    }
}

/// Copy the artifact tagged `src_tag` in `src` to `dst`, tagging it `dst_tag`.
///
/// Fails with `TagNotFound` when `src_tag` is unknown, with `BlobNotFound` or
/// `BlobCorrupted` when the source is missing or holds bad content, and with
/// `TransferFailed` for any other per-blob error. The destination tag is left
/// untouched on failure.
pub async fn copy(
    src: &dyn BlobStore,
    src_tag: &str,
    dst: &dyn BlobStore,
    dst_tag: &str,
    options: &CopyOptions,
    observer: &dyn TransferObserver,
) -> Result<TransferReport> {
    let manifest_desc = src.resolve(src_tag).await?;
    let manifest = Manifest::from_bytes(&src.get(&manifest_desc).await?)?;

    let mut blobs: Vec<Descriptor> = Vec::new();
    for desc in manifest.references() {
        if !blobs.iter().any(|b| b.digest == desc.digest) {
            blobs.push(desc.clone());
        }
    }

    tracing::info!(
        from = %src.location(),
        to = %dst.location(),
        src_tag,
        dst_tag,
        blobs = blobs.len(),
        "Copying deck"
    );

    let mut report = TransferReport {
        manifest: manifest_desc.clone(),
        uploaded: Vec::new(),
        skipped: Vec::new(),
    };

    let mut transfers = stream::iter(blobs)
        .map(|desc| copy_blob(src, dst, desc))
        .buffered(options.concurrency.max(1));

    while let Some(result) = transfers.next().await {
        let event = result?;
        observer.on_event(&event);
        report.record(&event);
    }
    drop(transfers);

    let event = copy_blob(src, dst, manifest_desc.clone()).await?;
    observer.on_event(&event);
    report.record(&event);

    dst.tag(&manifest_desc, dst_tag)
        .await
        .map_err(|e| transfer_error(&manifest_desc, e))?;

    tracing::info!(
        digest = %manifest_desc.digest,
        uploaded = report.uploaded.len(),
        skipped = report.skipped.len(),
        bytes = report.bytes_uploaded(),
        "Copied deck"
    );

    Ok(report)
}

async fn copy_blob(
    src: &dyn BlobStore,
    dst: &dyn BlobStore,
    desc: Descriptor,
) -> Result<TransferEvent> {
    if dst
        .exists(&desc)
        .await
        .map_err(|e| transfer_error(&desc, e))?
    {
        tracing::debug!(digest = %desc.digest, "Blob already present, skipping");
        return Ok(TransferEvent::Skipped(desc));
    }

    let data = src.get(&desc).await.map_err(|e| transfer_error(&desc, e))?;
    dst.put_if_absent(&desc.media_type, &data)
        .await
        .map_err(|e| transfer_error(&desc, e))?;

    tracing::debug!(digest = %desc.digest, size = desc.size, "Blob uploaded");
    Ok(TransferEvent::Uploaded(desc))
}

fn transfer_error(desc: &Descriptor, err: DeckError) -> DeckError {
    match err {
        DeckError::BlobNotFound(_)
        | DeckError::BlobCorrupted { .. }
        | DeckError::TransferFailed { .. } => err,
        other => DeckError::TransferFailed {
            digest: desc.digest.to_string(),
            message: other.to_string(),
        },
    }
}
