mod common;

use common::{drain, user, FlakyStore};
use pokecapture_core::{
    notice_channel, CaptureRecord, CaptureService, CaptureStore, CoreError, InMemoryCaptureStore,
    NoticeKind, NoticeSink,
};
use std::sync::Arc;

#[tokio::test]
async fn lookup_is_true_iff_a_matching_record_exists() {
    let store = Arc::new(InMemoryCaptureStore::with_records([CaptureRecord::new(
        user("u1"),
        "bulbasaur",
    )]));
    let service = CaptureService::new(store, NoticeSink::disabled());

    assert!(service.lookup(&user("u1"), "bulbasaur").await.unwrap());
    assert!(!service.lookup(&user("u1"), "BULBASAUR").await.unwrap());
    assert!(!service.lookup(&user("u2"), "bulbasaur").await.unwrap());
}

#[tokio::test]
async fn capture_creates_exactly_one_record_and_release_clears_duplicates() {
    let store = Arc::new(InMemoryCaptureStore::new());
    let service = CaptureService::new(store.clone(), NoticeSink::disabled());
    let u1 = user("u1");

    let captured = service.toggle(Some(&u1), "ivysaur", false).await.unwrap();
    assert!(captured);
    assert_eq!(store.find_matching(&u1, "ivysaur").await.unwrap().len(), 1);

    store
        .insert(&CaptureRecord::new(u1.clone(), "ivysaur"))
        .await
        .unwrap();

    let captured = service.toggle(Some(&u1), "ivysaur", true).await.unwrap();
    assert!(!captured);
    assert!(store.find_matching(&u1, "ivysaur").await.unwrap().is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn toggle_without_user_is_rejected_and_store_untouched() {
    let store = Arc::new(InMemoryCaptureStore::new());
    let (sink, mut rx) = notice_channel();
    let service = CaptureService::new(store.clone(), sink);

    let err = service.toggle(None, "ivysaur", false).await.unwrap_err();
    assert_eq!(err, CoreError::AuthRequired);
    assert!(store.is_empty());

    let notices = drain(&mut rx);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::AuthRequired);
}

#[tokio::test]
async fn toggle_reports_reread_state_not_optimistic_target() {
    // Stale `currently_captured = true` on an empty store: release path runs,
    // result comes from the re-read.
    let store = Arc::new(InMemoryCaptureStore::new());
    let service = CaptureService::new(store, NoticeSink::disabled());

    let captured = service
        .toggle(Some(&user("u1")), "ivysaur", true)
        .await
        .unwrap();
    assert!(!captured);
}

#[tokio::test]
async fn write_failure_maps_to_toggle_error_with_notice() {
    let store = Arc::new(FlakyStore {
        fail_writes: true,
        ..FlakyStore::default()
    });
    let (sink, mut rx) = notice_channel();
    let service = CaptureService::new(store.clone(), sink);

    let err = service
        .toggle(Some(&user("u1")), "ivysaur", false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Toggle(ref msg) if msg.contains("ivysaur")));
    assert!(store.inner.is_empty());

    let notices = drain(&mut rx);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].kind, NoticeKind::Toggle);
}

#[tokio::test]
async fn reread_failure_after_write_surfaces_lookup_error() {
    let store = Arc::new(FlakyStore::failing_lookup_for(&["ivysaur"]));
    let (sink, mut rx) = notice_channel();
    let service = CaptureService::new(store.clone(), sink);

    let err = service
        .toggle(Some(&user("u1")), "ivysaur", false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Lookup(_)));
    assert_eq!(store.inner.len(), 1, "the write itself is not rolled back");
    assert_eq!(drain(&mut rx)[0].kind, NoticeKind::Lookup);
}

#[tokio::test]
async fn padded_name_is_a_different_join_key() {
    let store = Arc::new(InMemoryCaptureStore::new());
    let service = CaptureService::new(store.clone(), NoticeSink::disabled());
    let u1 = user("u1");

    assert!(service.toggle(Some(&u1), " ivysaur ", false).await.unwrap());
    assert!(!service.lookup(&u1, "ivysaur").await.unwrap());
    assert_eq!(store.find_matching(&u1, " ivysaur ").await.unwrap().len(), 1);
}
