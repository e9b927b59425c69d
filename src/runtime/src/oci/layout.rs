//! Blob store backed by an OCI image layout directory.
//!
//! ```text
//! deck/
//! ├── oci-layout           {"imageLayoutVersion":"1.0.0"}
//! ├── index.json           manifest descriptors, tagged via ref.name
//! └── blobs/
//!     └── sha256/
//!         └── <hex>        one file per blob
//! ```
//!
//! Blob files are written to a temporary name and renamed into place, so a
//! reader never observes a partial blob and concurrent writers of the same
//! digest simply replace identical bytes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use deckpack_core::error::{DeckError, Result};
use deckpack_core::Digest;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::manifest::{Descriptor, ImageIndex};
use super::store::{BlobStore, PutOutcome};

const OCI_LAYOUT_FILE: &str = "oci-layout";
const INDEX_FILE: &str = "index.json";
const BLOBS_DIR: &str = "blobs";
const LAYOUT_VERSION: &str = "1.0.0";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OciLayout {
    image_layout_version: String,
}

/// OCI layout on the local filesystem.
pub struct LayoutStore {
    root: PathBuf,
    /// Serializes read-modify-write cycles on `index.json`.
    index_lock: Mutex<()>,
}

impl LayoutStore {
    /// Open a layout at `root`, initializing it if it does not exist yet.
    pub async fn create(root: &Path) -> Result<Self> {
        let blobs_dir = root.join(BLOBS_DIR).join(deckpack_core::digest::SHA256);
        tokio::fs::create_dir_all(&blobs_dir).await.map_err(|e| {
            DeckError::Other(format!(
                "Failed to create OCI layout at {}: {}",
                root.display(),
                e
            ))
        })?;

        let store = Self {
            root: root.to_path_buf(),
            index_lock: Mutex::new(()),
        };

        let layout_path = root.join(OCI_LAYOUT_FILE);
        if path_exists(&layout_path).await? {
            store.check_layout_version().await?;
        } else {
            let marker = serde_json::to_vec(&OciLayout {
                image_layout_version: LAYOUT_VERSION.to_string(),
            })?;
            write_atomic(&layout_path, &marker).await?;
        }

        if !path_exists(&root.join(INDEX_FILE)).await? {
            store.write_index(&ImageIndex::default()).await?;
        }

        tracing::debug!(root = %root.display(), "Opened OCI layout for writing");
        Ok(store)
    }

    /// Open an existing layout at `root` without modifying it.
    pub async fn open(root: &Path) -> Result<Self> {
        for required in [OCI_LAYOUT_FILE, INDEX_FILE, BLOBS_DIR] {
            if !path_exists(&root.join(required)).await? {
                return Err(DeckError::Other(format!(
                    "Not a valid OCI layout: missing {} in {}",
                    required,
                    root.display()
                )));
            }
        }

        let store = Self {
            root: root.to_path_buf(),
            index_lock: Mutex::new(()),
        };
        store.check_layout_version().await?;
        Ok(store)
    }

    /// Root directory of the layout.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding the blob with `digest`.
    pub fn blob_path(&self, digest: &Digest) -> PathBuf {
        self.root
            .join(BLOBS_DIR)
            .join(digest.algorithm())
            .join(digest.hex())
    }

    /// Tags recorded in `index.json`, in index order.
    pub async fn tags(&self) -> Result<Vec<String>> {
        let index = self.read_index().await?;
        Ok(index
            .manifests
            .iter()
            .filter_map(|d| d.annotation(super::manifest::ANNOTATION_REF_NAME))
            .map(str::to_string)
            .collect())
    }

    async fn check_layout_version(&self) -> Result<()> {
        let path = self.root.join(OCI_LAYOUT_FILE);
        let data = tokio::fs::read(&path).await?;
        let layout: OciLayout = serde_json::from_slice(&data).map_err(|e| {
            DeckError::Other(format!(
                "Invalid oci-layout file {}: {}",
                path.display(),
                e
            ))
        })?;
        if layout.image_layout_version != LAYOUT_VERSION {
            return Err(DeckError::Other(format!(
                "Unsupported OCI layout version {} in {}",
                layout.image_layout_version,
                self.root.display()
            )));
        }
        Ok(())
    }

    async fn read_index(&self) -> Result<ImageIndex> {
        let path = self.root.join(INDEX_FILE);
        let data = tokio::fs::read(&path).await.map_err(|e| {
            DeckError::Other(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_slice(&data).map_err(|e| {
            DeckError::SerializationError(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    async fn write_index(&self, index: &ImageIndex) -> Result<()> {
        let data = serde_json::to_vec_pretty(index)?;
        write_atomic(&self.root.join(INDEX_FILE), &data).await
    }
}

#[async_trait]
impl BlobStore for LayoutStore {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    async fn exists(&self, desc: &Descriptor) -> Result<bool> {
        path_exists(&self.blob_path(&desc.digest)).await
    }

    async fn put_if_absent(&self, media_type: &str, data: &[u8]) -> Result<PutOutcome> {
        let descriptor = Descriptor::for_bytes(media_type, data);
        let path = self.blob_path(&descriptor.digest);

        if path_exists(&path).await? {
            return Ok(PutOutcome {
                descriptor,
                written: false,
            });
        }

        write_atomic(&path, data).await?;
        tracing::debug!(
            digest = %descriptor.digest,
            size = descriptor.size,
            "Wrote blob to layout"
        );

        Ok(PutOutcome {
            descriptor,
            written: true,
        })
    }

    async fn fetch(&self, desc: &Descriptor) -> Result<Vec<u8>> {
        match tokio::fs::read(self.blob_path(&desc.digest)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DeckError::BlobNotFound(desc.digest.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn tag(&self, desc: &Descriptor, tag: &str) -> Result<()> {
        if !self.exists(desc).await? {
            return Err(DeckError::BlobNotFound(desc.digest.to_string()));
        }

        let _guard = self.index_lock.lock().await;
        let mut index = self.read_index().await?;
        index.set_tag(desc, tag);
        self.write_index(&index).await?;

        tracing::debug!(tag, digest = %desc.digest, "Tagged manifest in layout");
        Ok(())
    }

    async fn resolve(&self, tag: &str) -> Result<Descriptor> {
        let index = self.read_index().await?;
        index
            .find_tag(tag)
            .cloned()
            .ok_or_else(|| DeckError::TagNotFound(tag.to_string()))
    }
}

async fn path_exists(path: &Path) -> Result<bool> {
    match tokio::fs::metadata(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Write `data` to a sibling temp file, then rename it over `path`.
async fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        file_name,
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    tokio::fs::write(&tmp, data).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}
