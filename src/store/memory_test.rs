use super::*;
use crate::test_utils::dataplane;
use crate::Error;
use crate::StoreError;

#[tokio::test]
async fn get_should_return_proxy_not_found_for_unknown_key() {
    let store = MemoryResourceStore::new();

    let err = store.get(&ResourceKey::new("default", "ghost")).await.unwrap_err();

    assert!(err.is_proxy_not_found());
}

#[tokio::test]
async fn update_should_bump_version() {
    let store = MemoryResourceStore::new();
    let stored = store.insert(dataplane("default", "web-1", &[8080]));
    assert_eq!(stored.version, 1);

    let mut record = store.get(&stored.key()).await.unwrap();
    record.networking.inbound[0].health = Some(crate::InboundHealth { ready: false });
    let updated = store.update(record).await.unwrap();

    assert_eq!(updated.version, 2);
    let fetched = store.get(&stored.key()).await.unwrap();
    assert_eq!(fetched, updated);
}

#[tokio::test]
async fn update_with_stale_version_should_conflict() {
    let store = MemoryResourceStore::new();
    let stored = store.insert(dataplane("default", "web-1", &[8080]));

    let first = store.get(&stored.key()).await.unwrap();
    let second = first.clone();
    store.update(first).await.unwrap();

    match store.update(second).await {
        Err(Error::Store(StoreError::StoreWriteConflict { expected, actual, .. })) => {
            assert_eq!(expected, 1);
            assert_eq!(actual, 2);
        }
        other => panic!("expected write conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn update_of_removed_record_should_fail() {
    let store = MemoryResourceStore::new();
    let stored = store.insert(dataplane("default", "web-1", &[8080]));
    store.remove(&stored.key());

    assert!(store.update(stored).await.unwrap_err().is_proxy_not_found());
}

#[tokio::test]
async fn bootstrap_should_load_records() {
    let store = MemoryResourceStore::from_bootstrap_str(
        r#"
        [[dataplane]]
        mesh = "default"
        name = "web-1"

        [dataplane.networking]
        address = "192.168.0.1"

        [[dataplane.networking.inbound]]
        port = 10001
        service_port = 80
        tags = { "kuma.io/service" = "web" }

        [dataplane.networking.inbound.service_probe]
        timeout_in_ms = 3000

        [[dataplane]]
        mesh = "default"
        name = "ingress"
        kind = "zone_ingress"

        [dataplane.networking]
        address = "192.168.0.2"
        "#,
    )
    .unwrap();

    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 2);

    let web = store.get(&ResourceKey::new("default", "web-1")).await.unwrap();
    assert_eq!(web.networking.admin_port, 9901);
    assert_eq!(web.networking.inbound[0].workload_port(), 80);
    assert_eq!(
        web.networking.inbound[0].service_probe.unwrap().timeout_in_ms,
        Some(3000)
    );

    let ingress = store.get(&ResourceKey::new("default", "ingress")).await.unwrap();
    assert_eq!(ingress.kind, crate::ProxyKind::ZoneIngress);
}

#[tokio::test]
async fn bootstrap_should_reject_malformed_toml() {
    let err = MemoryResourceStore::from_bootstrap_str("[[dataplane]]\nmesh = ").unwrap_err();

    assert!(matches!(err, Error::Store(StoreError::Decode(_))));
}

#[tokio::test]
async fn bootstrap_file_should_be_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dataplanes.toml");
    std::fs::write(
        &path,
        "[[dataplane]]\nmesh = \"m\"\nname = \"n\"\n[dataplane.networking]\naddress = \"10.0.0.1\"\n",
    )
    .unwrap();

    let store = MemoryResourceStore::from_bootstrap_file(&path).unwrap();

    assert_eq!(store.len(), 1);
    assert!(MemoryResourceStore::from_bootstrap_file(dir.path().join("missing.toml")).is_err());
}
