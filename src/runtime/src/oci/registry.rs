//! Blob store backed by a container registry.
//!
//! Speaks the digest-addressed subset of the OCI distribution API:
//!
//! - `HEAD /v2/<repo>/blobs/<digest>`, `HEAD /v2/<repo>/manifests/<digest>`: existence
//! - `POST /v2/<repo>/blobs/uploads/` then `PUT <location>?digest=`: monolithic upload
//! - `GET/PUT /v2/<repo>/manifests/<reference>`: manifests and tags
//!
//! The existence check before every upload is what lets a second push of
//! a deck that shares card images with an earlier one skip those images.
//!
//! Requests are built directly on `reqwest`: the store works one blob at a
//! time, keyed by digest, and a client that pulls or pushes whole images
//! has no per-blob HEAD or upload.

use async_trait::async_trait;
use deckpack_core::error::{DeckError, Result};
use deckpack_core::Digest;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LOCATION};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};

use super::manifest::{Descriptor, MANIFEST_MEDIA_TYPE};
use super::reference::RegistryReference;
use super::store::{BlobStore, PutOutcome};

/// Credentials sent with every registry request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RegistryAuth {
    #[default]
    Anonymous,
    Basic { username: String, password: String },
}

impl RegistryAuth {
    /// Basic auth from `REGISTRY_USERNAME` and `REGISTRY_PASSWORD`, anonymous
    /// unless both are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match (lookup("REGISTRY_USERNAME"), lookup("REGISTRY_PASSWORD")) {
            (Some(username), Some(password)) => Self::Basic { username, password },
            _ => Self::Anonymous,
        }
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Self::Anonymous => request,
            Self::Basic { username, password } => request.basic_auth(username, Some(password)),
        }
    }
}

/// Repository in a remote registry, used as a blob store.
pub struct RegistryStore {
    client: Client,
    reference: RegistryReference,
    base_url: Url,
    auth: RegistryAuth,
}

impl RegistryStore {
    /// Create a store for the repository named by `reference`, anonymous access.
    pub fn new(reference: RegistryReference, plain_http: bool) -> Result<Self> {
        Self::with_auth(reference, plain_http, RegistryAuth::Anonymous)
    }

    /// Create a store with the given authentication.
    pub fn with_auth(
        reference: RegistryReference,
        plain_http: bool,
        auth: RegistryAuth,
    ) -> Result<Self> {
        let scheme = if plain_http { "http" } else { "https" };
        let base_url = Url::parse(&format!("{}://{}/", scheme, reference.registry)).map_err(|e| {
            DeckError::InvalidReference(format!(
                "Invalid registry host '{}': {}",
                reference.registry, e
            ))
        })?;

        let client = Client::builder()
            .user_agent(concat!("deckpack/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeckError::RegistryError {
                registry: reference.registry.clone(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            reference,
            base_url,
            auth,
        })
    }

    /// The repository this store reads and writes.
    pub fn reference(&self) -> &RegistryReference {
        &self.reference
    }

    fn url(&self, kind: &str, reference: &str) -> Result<Url> {
        self.base_url
            .join(&format!(
                "v2/{}/{}/{}",
                self.reference.repository, kind, reference
            ))
            .map_err(|e| self.error(format!("Invalid URL for {}: {}", reference, e)))
    }

    fn content_url(&self, desc: &Descriptor) -> Result<Url> {
        let kind = if desc.is_manifest() { "manifests" } else { "blobs" };
        self.url(kind, &desc.digest.to_string())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.auth.apply(self.client.request(method, url))
    }

    fn error(&self, message: String) -> DeckError {
        DeckError::RegistryError {
            registry: self.reference.registry.clone(),
            message,
        }
    }

    async fn send(&self, request: RequestBuilder, action: &str) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| self.error(format!("{} failed: {}", action, e)))
    }

    async fn expect_success(&self, response: Response, action: &str) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(self.error(format!(
            "{} failed: {} {}",
            action,
            status,
            body.trim()
        )))
    }

    async fn read_body(&self, response: Response, action: &str) -> Result<Vec<u8>> {
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| self.error(format!("{} failed reading body: {}", action, e)))
    }

    async fn upload_blob(&self, desc: &Descriptor, data: &[u8]) -> Result<()> {
        let action = format!("upload of {}", desc.digest);

        let start_url = self.url("blobs", "uploads/")?;
        let response = self
            .send(self.request(Method::POST, start_url), &action)
            .await?;
        let response = self.expect_success(response, &action).await?;

        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| self.error(format!("{}: no Location header in upload response", action)))?;
        let upload_url = self
            .base_url
            .join(location)
            .map_err(|e| self.error(format!("{}: invalid Location '{}': {}", action, location, e)))?;

        let request = self
            .request(Method::PUT, upload_url)
            .query(&[("digest", desc.digest.to_string())])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(data.to_vec());
        let response = self.send(request, &action).await?;
        self.expect_success(response, &action).await?;
        Ok(())
    }

    async fn put_manifest(&self, reference: &str, media_type: &str, data: &[u8]) -> Result<()> {
        let action = format!("manifest push to {}", reference);
        let request = self
            .request(Method::PUT, self.url("manifests", reference)?)
            .header(CONTENT_TYPE, media_type)
            .body(data.to_vec());
        let response = self.send(request, &action).await?;
        self.expect_success(response, &action).await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for RegistryStore {
    fn location(&self) -> String {
        format!("{}/{}", self.reference.registry, self.reference.repository)
    }

    async fn exists(&self, desc: &Descriptor) -> Result<bool> {
        let action = format!("existence check of {}", desc.digest);
        let mut request = self.request(Method::HEAD, self.content_url(desc)?);
        if desc.is_manifest() {
            request = request.header(ACCEPT, MANIFEST_MEDIA_TYPE);
        }
        let response = self.send(request, &action).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(self.error(format!("{} failed: {}", action, status))),
        }
    }

    async fn put_if_absent(&self, media_type: &str, data: &[u8]) -> Result<PutOutcome> {
        let descriptor = Descriptor::for_bytes(media_type, data);
        if self.exists(&descriptor).await? {
            return Ok(PutOutcome {
                descriptor,
                written: false,
            });
        }

        if descriptor.is_manifest() {
            self.put_manifest(&descriptor.digest.to_string(), media_type, data)
                .await?;
        } else {
            self.upload_blob(&descriptor, data).await?;
        }

        tracing::debug!(
            registry = %self.reference.registry,
            digest = %descriptor.digest,
            size = descriptor.size,
            "Uploaded blob to registry"
        );

        Ok(PutOutcome {
            descriptor,
            written: true,
        })
    }

    async fn fetch(&self, desc: &Descriptor) -> Result<Vec<u8>> {
        let action = format!("fetch of {}", desc.digest);
        let mut request = self.request(Method::GET, self.content_url(desc)?);
        if desc.is_manifest() {
            request = request.header(ACCEPT, MANIFEST_MEDIA_TYPE);
        }
        let response = self.send(request, &action).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DeckError::BlobNotFound(desc.digest.to_string()));
        }
        let response = self.expect_success(response, &action).await?;
        self.read_body(response, &action).await
    }

    async fn tag(&self, desc: &Descriptor, tag: &str) -> Result<()> {
        let data = self.get(desc).await?;
        self.put_manifest(tag, &desc.media_type, &data).await?;
        tracing::debug!(
            registry = %self.reference.registry,
            tag,
            digest = %desc.digest,
            "Tagged manifest in registry"
        );
        Ok(())
    }

    async fn resolve(&self, tag: &str) -> Result<Descriptor> {
        let action = format!("resolve of {}", tag);
        let request = self
            .request(Method::GET, self.url("manifests", tag)?)
            .header(ACCEPT, MANIFEST_MEDIA_TYPE);
        let response = self.send(request, &action).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(DeckError::TagNotFound(tag.to_string()));
        }
        let response = self.expect_success(response, &action).await?;

        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| MANIFEST_MEDIA_TYPE.to_string());
        let data = self.read_body(response, &action).await?;

        // A digest reference pins the content; the body must hash to it.
        if let Ok(pinned) = tag.parse::<Digest>() {
            pinned.verify(&data)?;
        }

        Ok(Descriptor::for_bytes(media_type, &data))
    }
}
