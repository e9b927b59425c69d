//! Shared fixtures for the integration tests.
//!
//! - [`TestRegistry`]: an in-memory OCI distribution registry served by axum
//!   on a random local port. It records every blob upload so tests can
//!   assert what crossed the wire.
//! - [`card_images`]: a temp directory holding a synthetic image for all 52
//!   cards under their canonical filenames.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use deckpack_core::{Card, Digest};
use parking_lot::Mutex;
use tempfile::TempDir;

#[derive(Default)]
struct RegistryState {
    /// Blobs by digest string.
    blobs: HashMap<String, Vec<u8>>,
    /// Manifests by digest string: (content type, bytes).
    manifests: HashMap<String, (String, Vec<u8>)>,
    /// `<repo>:<tag>` to manifest digest.
    tags: HashMap<String, String>,
    next_upload: u64,
    /// Digests received through blob uploads, in arrival order.
    blob_uploads: Vec<String>,
}

type Shared = Arc<Mutex<RegistryState>>;

/// Registry running for the lifetime of the value.
pub struct TestRegistry {
    port: u16,
    state: Shared,
    _shutdown: tokio::sync::oneshot::Sender<()>,
}

impl TestRegistry {
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind to random port");
        let port = listener.local_addr().unwrap().port();

        let state: Shared = Arc::new(Mutex::new(RegistryState::default()));
        let app = Router::new().fallback(handle).with_state(state.clone());
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    rx.await.ok();
                })
                .await
                .ok();
        });

        // Wait for the server to be ready.
        let client = reqwest::Client::new();
        for _ in 0..50 {
            if client
                .get(format!("http://127.0.0.1:{port}/v2/"))
                .send()
                .await
                .is_ok()
            {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        Self {
            port,
            state,
            _shutdown: tx,
        }
    }

    /// `127.0.0.1:<port>`
    pub fn host(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    /// Full reference for `repo_and_tag` on this registry.
    pub fn reference(&self, repo_and_tag: &str) -> String {
        format!("{}/{}", self.host(), repo_and_tag)
    }

    /// Digests received through blob uploads since start or the last reset.
    pub fn blob_uploads(&self) -> Vec<String> {
        self.state.lock().blob_uploads.clone()
    }

    pub fn reset_uploads(&self) {
        self.state.lock().blob_uploads.clear();
    }

    pub fn has_blob(&self, digest: &str) -> bool {
        self.state.lock().blobs.contains_key(digest)
    }

    pub fn tag_digest(&self, repo: &str, tag: &str) -> Option<String> {
        self.state.lock().tags.get(&format!("{repo}:{tag}")).cloned()
    }

    /// Replace the stored bytes of a blob without changing its key.
    pub fn corrupt_blob(&self, digest: &str, data: &[u8]) {
        let mut state = self.state.lock();
        assert!(state.blobs.contains_key(digest), "no blob {digest}");
        state.blobs.insert(digest.to_string(), data.to_vec());
    }

    /// Serve `data` for requests of the manifest stored under `digest`.
    pub fn replace_manifest(&self, digest: &str, data: &[u8]) {
        let mut state = self.state.lock();
        let entry = state
            .manifests
            .get_mut(digest)
            .unwrap_or_else(|| panic!("no manifest {digest}"));
        entry.1 = data.to_vec();
    }

    pub fn manifest_bytes(&self, digest: &str) -> Option<Vec<u8>> {
        self.state.lock().manifests.get(digest).map(|(_, data)| data.clone())
    }
}

/// Write a distinct fake image for every card into a new temp directory.
pub fn card_images() -> TempDir {
    let dir = TempDir::new().unwrap();
    for card in Card::all() {
        std::fs::write(dir.path().join(card.filename()), image_bytes(&card.code())).unwrap();
    }
    dir
}

/// The synthetic image written for `code`.
pub fn image_bytes(code: &str) -> Vec<u8> {
    let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
    data.extend_from_slice(format!("card:{code}").as_bytes());
    data
}

pub fn codes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

async fn handle(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path();
    if path == "/v2/" || path == "/v2" {
        return StatusCode::OK.into_response();
    }
    let Some(rest) = path.strip_prefix("/v2/") else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Some((repo, _session)) = rest.split_once("/blobs/uploads/") {
        return match method {
            Method::POST => start_upload(&state, repo),
            Method::PUT => finish_upload(&state, &uri, &body),
            _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
        };
    }
    if let Some((_repo, digest)) = rest.rsplit_once("/blobs/") {
        return match method {
            Method::GET | Method::HEAD => get_blob(&state, digest),
            _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
        };
    }
    if let Some((repo, reference)) = rest.rsplit_once("/manifests/") {
        return match method {
            Method::PUT => put_manifest(&state, repo, reference, &headers, &body),
            Method::GET | Method::HEAD => get_manifest(&state, repo, reference),
            _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
        };
    }
    StatusCode::NOT_FOUND.into_response()
}

fn start_upload(state: &Shared, repo: &str) -> Response {
    let mut state = state.lock();
    state.next_upload += 1;
    let location = format!("/v2/{}/blobs/uploads/{}", repo, state.next_upload);
    (StatusCode::ACCEPTED, [(header::LOCATION, location)]).into_response()
}

fn finish_upload(state: &Shared, uri: &Uri, body: &Bytes) -> Response {
    let expected = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .find_map(|pair| pair.strip_prefix("digest="))
        .map(|d| d.replace("%3A", ":").replace("%3a", ":"));
    let Some(expected) = expected else {
        return (StatusCode::BAD_REQUEST, "missing digest").into_response();
    };
    let actual = Digest::of(body).to_string();
    if actual != expected {
        return (StatusCode::BAD_REQUEST, "digest mismatch").into_response();
    }

    let mut state = state.lock();
    state.blobs.insert(actual.clone(), body.to_vec());
    state.blob_uploads.push(actual);
    StatusCode::CREATED.into_response()
}

fn get_blob(state: &Shared, digest: &str) -> Response {
    match state.lock().blobs.get(digest) {
        Some(data) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream".to_string())],
            data.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn put_manifest(
    state: &Shared,
    repo: &str,
    reference: &str,
    headers: &HeaderMap,
    body: &Bytes,
) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let digest = Digest::of(body).to_string();
    if reference.starts_with("sha256:") && reference != digest {
        return (StatusCode::BAD_REQUEST, "digest mismatch").into_response();
    }

    let mut state = state.lock();
    state
        .manifests
        .insert(digest.clone(), (content_type, body.to_vec()));
    if !reference.starts_with("sha256:") {
        state.tags.insert(format!("{repo}:{reference}"), digest);
    }
    StatusCode::CREATED.into_response()
}

fn get_manifest(state: &Shared, repo: &str, reference: &str) -> Response {
    let state = state.lock();
    let digest = if reference.starts_with("sha256:") {
        Some(reference.to_string())
    } else {
        state.tags.get(&format!("{repo}:{reference}")).cloned()
    };
    match digest.and_then(|d| state.manifests.get(&d)) {
        Some((content_type, data)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type.clone())],
            data.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
