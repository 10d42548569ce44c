use std::time::Duration;

use tokio::time::timeout;

use super::*;
use crate::test_utils::node;
use crate::test_utils::specifier;

fn watch_request(
    node_id: &str,
    version: &str,
) -> WatchRequest {
    WatchRequest {
        node: node(node_id),
        type_url: HEALTH_CHECK_SPECIFIER_TYPE.to_string(),
        version_info: version.to_string(),
    }
}

#[test]
fn absent_snapshot_is_not_found_but_empty_one_is() {
    let cache = SnapshotCache::default();

    assert!(cache.get_snapshot("default.web-1").is_none());
    assert!(!cache.has_snapshot("default.web-1"));

    cache.set_snapshot("default.web-1", Snapshot::empty()).unwrap();

    let found = cache.get_snapshot("default.web-1").unwrap();
    assert!(found.is_empty());
    assert!(cache.has_snapshot("default.web-1"));
}

#[test]
fn set_snapshot_rejects_inconsistent_content() {
    let cache = SnapshotCache::default();
    let mut broken = specifier(&["localhost:80"]);
    broken.cluster_health_checks[0].health_checks.clear();

    assert!(cache.set_snapshot("default.web-1", Snapshot::new(broken)).is_err());
    assert!(!cache.has_snapshot("default.web-1"));
}

#[test]
fn update_leaves_entry_untouched_when_closure_declines() {
    let cache = SnapshotCache::default();
    let original = Snapshot::new(specifier(&["localhost:80"])).with_version("3");
    cache.set_snapshot("k", original.clone()).unwrap();

    let committed = cache.update("k", |_| None).unwrap();

    assert!(committed.is_none());
    assert_eq!(cache.get_snapshot("k").unwrap().version(), "3");
}

#[test]
fn update_sees_current_entry() {
    let cache = SnapshotCache::default();
    cache
        .set_snapshot("k", Snapshot::new(specifier(&["localhost:80"])).with_version("3"))
        .unwrap();

    let committed = cache
        .update("k", |current| {
            assert_eq!(current.map(|s| s.version()), Some("3"));
            Some(Snapshot::new(specifier(&["localhost:81"])).with_version(next_version(current)))
        })
        .unwrap()
        .unwrap();

    assert_eq!(committed.version(), "4");
    assert_eq!(cache.get_snapshot("k").unwrap(), committed);
}

#[test]
fn node_keys_and_clear() {
    let cache = SnapshotCache::default();
    cache.set_snapshot("b.x", Snapshot::empty()).unwrap();
    cache.set_snapshot("a.x", Snapshot::empty()).unwrap();

    assert_eq!(cache.node_keys(), vec!["a.x".to_string(), "b.x".to_string()]);

    cache.clear_snapshot("a.x");
    assert_eq!(cache.node_keys(), vec!["b.x".to_string()]);
}

#[tokio::test]
async fn watch_is_answered_immediately_when_version_differs() {
    let cache = SnapshotCache::default();
    cache
        .set_snapshot("default.web-1", Snapshot::new(specifier(&["localhost:80"])).with_version("1"))
        .unwrap();

    let (rx, _handle) = cache.create_watch(watch_request("default.web-1", ""));

    let response = timeout(Duration::from_millis(50), rx).await.unwrap().unwrap();
    assert_eq!(response.version, "1");
    assert_eq!(response.specifier.cluster_health_checks.len(), 1);
    assert_eq!(cache.pending_watches("default.web-1"), 0);
}

#[tokio::test]
async fn watch_waits_for_newer_version() {
    let cache = SnapshotCache::default();
    cache
        .set_snapshot("default.web-1", Snapshot::new(specifier(&["localhost:80"])).with_version("1"))
        .unwrap();

    let (mut rx, _handle) = cache.create_watch(watch_request("default.web-1", "1"));
    assert!(rx.try_recv().is_err());
    assert_eq!(cache.pending_watches("default.web-1"), 1);

    cache
        .set_snapshot("default.web-1", Snapshot::new(specifier(&["localhost:81"])).with_version("2"))
        .unwrap();

    let response = timeout(Duration::from_millis(50), rx).await.unwrap().unwrap();
    assert_eq!(response.version, "2");
    assert_eq!(response.specifier.cluster_health_checks[0].cluster_name, "localhost:81");
    assert_eq!(cache.pending_watches("default.web-1"), 0);
}

#[tokio::test]
async fn watch_on_unknown_node_waits_for_first_snapshot() {
    let cache = SnapshotCache::default();

    let (rx, _handle) = cache.create_watch(watch_request("default.web-1", ""));
    cache
        .set_snapshot("default.web-1", Snapshot::new(specifier(&["localhost:80"])).with_version("1"))
        .unwrap();

    let response = timeout(Duration::from_millis(50), rx).await.unwrap().unwrap();
    assert_eq!(response.version, "1");
}

#[tokio::test]
async fn empty_snapshot_answers_with_default_specifier() {
    let cache = SnapshotCache::default();
    let (rx, _handle) = cache.create_watch(watch_request("default.web-1", "1"));

    cache
        .set_snapshot("default.web-1", Snapshot::empty().with_version("2"))
        .unwrap();

    let response = rx.await.unwrap();
    assert_eq!(response.version, "2");
    assert!(response.specifier.cluster_health_checks.is_empty());
}

#[tokio::test]
async fn dropping_handle_unregisters_watch() {
    let cache = SnapshotCache::default();

    let (mut rx, handle) = cache.create_watch(watch_request("default.web-1", ""));
    assert_eq!(cache.pending_watches("default.web-1"), 1);

    handle.cancel();
    assert_eq!(cache.pending_watches("default.web-1"), 0);

    cache
        .set_snapshot("default.web-1", Snapshot::empty().with_version("1"))
        .unwrap();
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn clear_snapshot_closes_pending_watches() {
    let cache = SnapshotCache::default();
    let (rx, _handle) = cache.create_watch(watch_request("default.web-1", ""));

    cache.clear_snapshot("default.web-1");

    assert!(rx.await.is_err());
}

#[tokio::test]
async fn fresh_watch_on_cleared_entry_waits_for_content() {
    let cache = SnapshotCache::default();
    cache
        .set_snapshot("default.web-1", Snapshot::empty().with_version("2"))
        .unwrap();

    let (mut rx, _handle) = cache.create_watch(watch_request("default.web-1", ""));
    assert!(rx.try_recv().is_err());
    assert_eq!(cache.pending_watches("default.web-1"), 1);

    cache
        .set_snapshot("default.web-1", Snapshot::empty().with_version("3"))
        .unwrap();
    assert!(rx.try_recv().is_err());

    cache
        .set_snapshot("default.web-1", Snapshot::new(specifier(&["localhost:80"])).with_version("4"))
        .unwrap();

    let response = timeout(Duration::from_millis(50), rx).await.unwrap().unwrap();
    assert_eq!(response.version, "4");
    assert_eq!(response.specifier.cluster_health_checks.len(), 1);
}

#[tokio::test]
async fn watch_holding_a_version_sees_cleared_entry_immediately() {
    let cache = SnapshotCache::default();
    cache
        .set_snapshot("default.web-1", Snapshot::empty().with_version("2"))
        .unwrap();

    let (rx, _handle) = cache.create_watch(watch_request("default.web-1", "1"));

    let response = timeout(Duration::from_millis(50), rx).await.unwrap().unwrap();
    assert_eq!(response.version, "2");
    assert!(response.specifier.cluster_health_checks.is_empty());
}
