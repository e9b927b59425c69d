//! Integration tests: decks pushed to and pulled from a registry.
//!
//! Every test runs against an in-process registry on a random local port
//! (see `common::TestRegistry`), so no network access is needed.

mod common;

use common::{card_images, codes, image_bytes, TestRegistry};
use deckpack_core::{DeckError, Digest};
use deckpack_runtime::oci::manifest::{CARD_MEDIA_TYPE, CONFIG_MEDIA_TYPE};
use deckpack_runtime::oci::transfer::SilentObserver;
use deckpack_runtime::{
    copy, load_deck, BlobStore, CopyOptions, DeckBuilder, Descriptor, DirectoryAssets,
    LayoutStore, RegistryReference, RegistryStore, StoreTarget, TransferEvent,
};
use parking_lot::Mutex;
use tempfile::TempDir;

fn registry_store(registry: &TestRegistry, repo_and_tag: &str) -> RegistryStore {
    let reference = RegistryReference::parse(&registry.reference(repo_and_tag)).unwrap();
    RegistryStore::new(reference, true).unwrap()
}

fn card_digest(code: &str) -> String {
    Digest::of(&image_bytes(code)).to_string()
}

async fn push(
    registry_store: &RegistryStore,
    assets: &DirectoryAssets,
    list: &[&str],
    tag: &str,
) -> deckpack_runtime::TransferReport {
    let built = DeckBuilder::new(assets)
        .build(&codes(list), tag)
        .await
        .unwrap();
    copy(
        &built.store,
        tag,
        registry_store,
        tag,
        &CopyOptions::default(),
        &SilentObserver,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_push_then_load_from_registry() {
    let registry = TestRegistry::start().await;
    let images = card_images();
    let assets = DirectoryAssets::new(images.path());
    let store = registry_store(&registry, "deck:v1");

    let report = push(&store, &assets, &["2c", "ad"], "v1").await;
    assert_eq!(report.uploaded.len(), 4);
    assert!(report.skipped.is_empty());
    assert_eq!(
        registry.tag_digest("deck", "v1"),
        Some(report.manifest.digest.to_string())
    );

    let deck = load_deck(&store, "v1").await.unwrap();
    assert_eq!(deck.cards, vec!["2c", "ad"]);
    assert_eq!(deck.image("2_of_clubs.png"), Some(&image_bytes("2c")[..]));
    assert_eq!(deck.image("ace_of_diamonds.png"), Some(&image_bytes("ad")[..]));
}

#[tokio::test]
async fn test_second_version_uploads_only_new_image() {
    let registry = TestRegistry::start().await;
    let images = card_images();
    let assets = DirectoryAssets::new(images.path());
    let store = registry_store(&registry, "deck");

    push(&store, &assets, &["2c", "ad"], "v1").await;
    registry.reset_uploads();

    let events = Mutex::new(Vec::new());
    let observer = |e: &TransferEvent| events.lock().push(e.clone());
    let built = DeckBuilder::new(&assets)
        .build(&codes(&["2c", "kh"]), "v2")
        .await
        .unwrap();
    copy(
        &built.store,
        "v2",
        &store,
        "v2",
        &CopyOptions::default(),
        &observer,
    )
    .await
    .unwrap();

    // Only the new card image and the new config blob crossed the wire.
    let uploads = registry.blob_uploads();
    assert_eq!(uploads.len(), 2);
    assert!(uploads.contains(&card_digest("kh")));
    assert!(!uploads.contains(&card_digest("2c")));

    let card_events: Vec<(bool, String)> = events
        .lock()
        .iter()
        .filter(|e| e.descriptor().media_type == CARD_MEDIA_TYPE)
        .map(|e| (e.is_upload(), e.descriptor().title().unwrap_or_default().to_string()))
        .collect();
    assert_eq!(
        card_events,
        vec![
            (false, "2_of_clubs.png".to_string()),
            (true, "king_of_hearts.png".to_string()),
        ]
    );

    // Both versions stay loadable.
    assert_eq!(load_deck(&store, "v1").await.unwrap().cards, vec!["2c", "ad"]);
    assert_eq!(load_deck(&store, "v2").await.unwrap().cards, vec!["2c", "kh"]);
}

#[tokio::test]
async fn test_repush_uploads_nothing() {
    let registry = TestRegistry::start().await;
    let images = card_images();
    let assets = DirectoryAssets::new(images.path());
    let store = registry_store(&registry, "deck");

    push(&store, &assets, &["3h", "4h", "5h"], "latest").await;
    registry.reset_uploads();
    let report = push(&store, &assets, &["3h", "4h", "5h"], "latest").await;

    assert!(registry.blob_uploads().is_empty());
    assert!(report.uploaded.is_empty());
    assert_eq!(report.skipped.len(), 5);
}

#[tokio::test]
async fn test_full_deck_with_parallel_uploads() {
    let registry = TestRegistry::start().await;
    let images = card_images();
    let assets = DirectoryAssets::new(images.path());
    let store = registry_store(&registry, "decks/full");

    let all: Vec<String> = deckpack_core::Card::all().map(|c| c.code()).collect();
    let built = DeckBuilder::new(&assets).build(&all, "full").await.unwrap();
    let report = copy(
        &built.store,
        "full",
        &store,
        "full",
        &CopyOptions { concurrency: 8 },
        &SilentObserver,
    )
    .await
    .unwrap();

    // 52 images + config, each uploaded exactly once.
    let mut uploads = registry.blob_uploads();
    assert_eq!(uploads.len(), 53);
    uploads.sort();
    uploads.dedup();
    assert_eq!(uploads.len(), 53);

    // Events come back in manifest order regardless of fan-out.
    let titles: Vec<&str> = report
        .uploaded
        .iter()
        .filter(|d| d.media_type == CARD_MEDIA_TYPE)
        .filter_map(Descriptor::title)
        .collect();
    let expected: Vec<String> = deckpack_core::Card::all().map(|c| c.filename()).collect();
    assert_eq!(titles, expected);
    assert_eq!(report.uploaded[0].media_type, CONFIG_MEDIA_TYPE);

    let deck = load_deck(&store, "full").await.unwrap();
    assert_eq!(deck.len(), 52);
    assert_eq!(deck.images.len(), 52);
}

#[tokio::test]
async fn test_corrupted_registry_blob_detected() {
    let registry = TestRegistry::start().await;
    let images = card_images();
    let assets = DirectoryAssets::new(images.path());
    let store = registry_store(&registry, "deck");

    push(&store, &assets, &["2c", "ad"], "latest").await;
    registry.corrupt_blob(&card_digest("ad"), b"\x89PNG not really");

    let err = load_deck(&store, "latest").await.unwrap_err();
    assert!(matches!(err, DeckError::BlobCorrupted { .. }));
}

#[tokio::test]
async fn test_unknown_tag_and_blob() {
    let registry = TestRegistry::start().await;
    let store = registry_store(&registry, "deck");

    let err = store.resolve("nope").await.unwrap_err();
    assert!(matches!(err, DeckError::TagNotFound(t) if t == "nope"));

    let ghost = Descriptor::for_bytes(CARD_MEDIA_TYPE, b"ghost");
    assert!(!store.exists(&ghost).await.unwrap());
    let err = store.get(&ghost).await.unwrap_err();
    assert!(matches!(err, DeckError::BlobNotFound(_)));
}

#[tokio::test]
async fn test_registry_to_layout_copy() {
    let registry = TestRegistry::start().await;
    let images = card_images();
    let assets = DirectoryAssets::new(images.path());
    let remote = registry_store(&registry, "deck");
    push(&remote, &assets, &["10s", "js", "qs"], "v1").await;

    let out = TempDir::new().unwrap();
    let layout = LayoutStore::create(&out.path().join("deck")).await.unwrap();
    let report = copy(
        &remote,
        "v1",
        &layout,
        "latest",
        &CopyOptions::default(),
        &SilentObserver,
    )
    .await
    .unwrap();
    assert_eq!(report.uploaded.len(), 5);

    let from_remote = load_deck(&remote, "v1").await.unwrap();
    let from_layout = load_deck(&layout, "latest").await.unwrap();
    assert_eq!(from_layout, from_remote);
    assert_eq!(from_layout.cards, vec!["10s", "js", "qs"]);
}

#[tokio::test]
async fn test_load_by_pinned_digest() {
    let registry = TestRegistry::start().await;
    let images = card_images();
    let assets = DirectoryAssets::new(images.path());
    let store = registry_store(&registry, "deck");

    let v1 = push(&store, &assets, &["2c", "ad"], "v1").await;
    push(&store, &assets, &["kh"], "v1").await;

    // The tag moved on; the digest still names the first deck.
    let location = format!("{}@{}", registry.reference("deck"), v1.manifest.digest);
    let target = StoreTarget::parse(&location).unwrap();
    assert_eq!(target.read_reference(), v1.manifest.digest.to_string());

    let opened = target.open(true).await.unwrap();
    let deck = load_deck(opened.as_ref(), &target.read_reference())
        .await
        .unwrap();
    assert_eq!(deck.cards, vec!["2c", "ad"]);
    assert_eq!(deck.image("ace_of_diamonds.png"), Some(&image_bytes("ad")[..]));
}

#[tokio::test]
async fn test_manifest_not_matching_pinned_digest_rejected() {
    let registry = TestRegistry::start().await;
    let images = card_images();
    let assets = DirectoryAssets::new(images.path());
    let store = registry_store(&registry, "deck");

    let v1 = push(&store, &assets, &["2c"], "v1").await;
    let v2 = push(&store, &assets, &["kh"], "v2").await;
    let v1_digest = v1.manifest.digest.to_string();
    let other = registry
        .manifest_bytes(&v2.manifest.digest.to_string())
        .unwrap();
    registry.replace_manifest(&v1_digest, &other);

    let err = store.resolve(&v1_digest).await.unwrap_err();
    assert!(matches!(err, DeckError::BlobCorrupted { .. }), "{err:?}");

    let err = load_deck(&store, &v1_digest).await.unwrap_err();
    assert!(err.is_integrity_violation(), "{err:?}");
}

#[tokio::test]
async fn test_unreachable_registry_fails_transfer() {
    // Bind and drop a listener to get a port nothing listens on.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let reference = RegistryReference::parse(&format!("127.0.0.1:{port}/deck")).unwrap();
    let store = RegistryStore::new(reference, true).unwrap();

    let images = card_images();
    let assets = DirectoryAssets::new(images.path());
    let built = DeckBuilder::new(&assets)
        .build(&codes(&["2c"]), "latest")
        .await
        .unwrap();

    let err = copy(
        &built.store,
        "latest",
        &store,
        "latest",
        &CopyOptions::default(),
        &SilentObserver,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, DeckError::TransferFailed { .. }));
}
