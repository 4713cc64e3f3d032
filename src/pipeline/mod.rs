use crate::events::{self, ChangeNotification};
use crate::merge::{self, VersionDelta};
use crate::publish;
use crate::store::{ObjectStore, RegistryStore};
use crate::tarball;
use futures::future::join_all;
use npmreg_core::{sort_descending, PackageManifest, SemanticVersion, VersionRecord};
use tracing::{info, warn};

/// Summary of one processed notification batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Packages with at least one conforming record in the batch.
    pub packages: usize,
    /// Manifests successfully written back.
    pub published: usize,
    /// Manifests that merged but failed to write.
    pub publish_failures: usize,
}

/// Process one notification batch against the configured bucket.
///
/// Packages are independent and handled concurrently; within one package
/// the batch's records are applied strictly in input order. Notifications
/// for a different bucket are logged and ignored.
pub async fn process_event_batch<S: ObjectStore>(
    store: &RegistryStore<S>,
    bucket: &str,
    notifications: Vec<ChangeNotification>,
) -> BatchOutcome {
    let mut matching = Vec::new();
    for notification in notifications {
        if notification.bucket == bucket {
            matching.push(notification);
        } else {
            warn!(
                "Ignoring notification for foreign bucket {}: {}",
                notification.bucket, notification.key
            );
        }
    }

    let groups = events::group_by_package(matching);
    let packages = groups.len();

    let merged = join_all(
        groups
            .iter()
            .map(|(package, records)| process_package(store, package, records)),
    )
    .await;
    let manifests: Vec<PackageManifest> = merged.into_iter().flatten().collect();

    let publish_failures = publish::publish_manifests(store, &manifests).await;

    BatchOutcome {
        packages,
        published: manifests.len() - publish_failures,
        publish_failures,
    }
}

/// Merge one package's batch records into its next manifest state.
///
/// Returns None when no current latest version can be resolved; the stored
/// manifest, if any, is then left untouched.
async fn process_package<S: ObjectStore>(
    store: &RegistryStore<S>,
    package: &str,
    records: &[ChangeNotification],
) -> Option<PackageManifest> {
    let existing = store.get_manifest(package).await.unwrap_or_default();

    // Scatter-gather over every touched key: all loads run concurrently and
    // every result is collected, success or failure, before merging.
    let loaded = join_all(records.iter().map(|record| async move {
        (
            record.key.clone(),
            load_version_record(store, &record.key).await,
        )
    }))
    .await;

    let deltas: Vec<(String, VersionDelta)> = loaded
        .into_iter()
        .map(|(key, result)| {
            let version = events::package_version(&key).to_string();
            match result {
                Some(record) => (version, VersionDelta::Record(record)),
                None => (version, VersionDelta::Removed),
            }
        })
        .collect();

    let latest = resolve_latest(store, package).await;
    if latest.is_none() {
        info!(
            "No latest version could be resolved for {}; leaving manifest untouched",
            package
        );
    }

    merge::update_manifest(&existing, latest.as_ref(), &deltas)
}

/// Fetch and extract one version object; any failure yields None.
async fn load_version_record<S: ObjectStore>(
    store: &RegistryStore<S>,
    key: &str,
) -> Option<VersionRecord> {
    let data = store.get_version_object(key).await?;
    match tarball::extract_version_record(&data.bytes, store.tarball_url(key), data.last_modified)
    {
        Ok(record) => Some(record),
        Err(e) => {
            info!("Package object {} could not be extracted: {}", key, e);
            None
        }
    }
}

/// Re-resolve the package's current latest version record by re-listing the
/// objects actually present.
///
/// The batch's own maximum is not enough: a batch may remove the current
/// latest, in which case the next-highest remaining version takes over.
pub(crate) async fn resolve_latest<S: ObjectStore>(
    store: &RegistryStore<S>,
    package: &str,
) -> Option<VersionRecord> {
    let mut objects: Vec<_> = store
        .list_version_objects(package)
        .await
        .into_iter()
        .filter(|object| events::conforms(&object.key))
        .collect();
    if objects.is_empty() {
        return None;
    }

    sort_descending(&mut objects, |object| {
        SemanticVersion::parse(events::package_version(&object.key))
            .unwrap_or(SemanticVersion::new(0, 0, 0))
    });

    load_version_record(store, &objects[0].key).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::events::EventKind;
    use crate::store::MemoryStore;
    use chrono::{DateTime, Utc};

    const BUCKET: &str = "packages";

    fn ts(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn registry(store: MemoryStore) -> RegistryStore<MemoryStore> {
        let config = RegistryConfig {
            bucket: BUCKET.to_string(),
            ..Default::default()
        };
        RegistryStore::new(store, &config)
    }

    fn upload(store: &MemoryStore, package: &str, version: &str, seconds: i64) -> ChangeNotification {
        let key = format!("{}/{}-{}.tgz", package, package, version);
        let descriptor = format!(
            r#"{{"name":"{}","version":"{}","description":"test package"}}"#,
            package, version
        );
        store.put_object(&key, tarball::make_tarball(&descriptor), ts(seconds));
        ChangeNotification {
            bucket: BUCKET.to_string(),
            key,
            kind: EventKind::Created,
        }
    }

    fn removal(package: &str, version: &str) -> ChangeNotification {
        ChangeNotification {
            bucket: BUCKET.to_string(),
            key: format!("{}/{}-{}.tgz", package, package, version),
            kind: EventKind::Removed,
        }
    }

    #[tokio::test]
    async fn test_single_upload_creates_manifest() {
        let store = MemoryStore::new();
        let event = upload(&store, "left-pad", "1.0.0", 100);
        let registry = registry(store);

        let outcome = process_event_batch(&registry, BUCKET, vec![event]).await;
        assert_eq!(outcome.packages, 1);
        assert_eq!(outcome.published, 1);
        assert_eq!(outcome.publish_failures, 0);

        let manifest = registry.get_manifest("left-pad").await.unwrap();
        assert_eq!(manifest.latest_version(), Some("1.0.0"));
        assert_eq!(manifest.name, "left-pad");
        assert!(manifest.time.contains_key("created"));
        assert!(manifest.versions["1.0.0"].dist.shasum.len() == 40);
    }

    #[tokio::test]
    async fn test_latest_re_resolved_after_removing_newest() {
        let store = MemoryStore::new();
        let first = upload(&store, "pkg", "1.0.0", 100);
        let second = upload(&store, "pkg", "2.0.0", 200);
        let registry = registry(store);

        process_event_batch(&registry, BUCKET, vec![first, second]).await;
        assert_eq!(
            registry.get_manifest("pkg").await.unwrap().latest_version(),
            Some("2.0.0")
        );

        // Remove the current latest; 1.0.0 must take over.
        registry.backing_store().remove_object("pkg/pkg-2.0.0.tgz");
        process_event_batch(&registry, BUCKET, vec![removal("pkg", "2.0.0")]).await;

        let manifest = registry.get_manifest("pkg").await.unwrap();
        assert_eq!(manifest.latest_version(), Some("1.0.0"));
        assert!(!manifest.versions.contains_key("2.0.0"));
        assert!(!manifest.time.contains_key("2.0.0"));
    }

    #[tokio::test]
    async fn test_removing_everything_leaves_manifest_untouched() {
        let store = MemoryStore::new();
        let event = upload(&store, "pkg", "1.0.0", 100);
        let registry = registry(store);

        process_event_batch(&registry, BUCKET, vec![event]).await;
        let before = registry.get_manifest("pkg").await.unwrap();

        registry.backing_store().remove_object("pkg/pkg-1.0.0.tgz");
        let outcome =
            process_event_batch(&registry, BUCKET, vec![removal("pkg", "1.0.0")]).await;

        assert_eq!(outcome.published, 0);
        let after = registry.get_manifest("pkg").await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_corrupt_latest_skips_merge() {
        let store = MemoryStore::new();
        let good = upload(&store, "pkg", "1.0.0", 100);
        store.put_object("pkg/pkg-2.0.0.tgz", b"garbage".to_vec(), ts(200));
        let corrupt = ChangeNotification {
            bucket: BUCKET.to_string(),
            key: "pkg/pkg-2.0.0.tgz".to_string(),
            kind: EventKind::Created,
        };
        let registry = registry(store);

        process_event_batch(&registry, BUCKET, vec![good, corrupt]).await;

        // 2.0.0 is the highest present version but fails extraction, so no
        // latest resolves and the merge is skipped for the whole package.
        assert!(registry.get_manifest("pkg").await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_older_version_degrades_to_removal() {
        let store = MemoryStore::new();
        let good = upload(&store, "pkg", "2.0.0", 200);
        store.put_object("pkg/pkg-1.0.0.tgz", b"garbage".to_vec(), ts(100));
        let corrupt = ChangeNotification {
            bucket: BUCKET.to_string(),
            key: "pkg/pkg-1.0.0.tgz".to_string(),
            kind: EventKind::Created,
        };
        let registry = registry(store);

        process_event_batch(&registry, BUCKET, vec![good, corrupt]).await;

        let manifest = registry.get_manifest("pkg").await.unwrap();
        assert_eq!(manifest.latest_version(), Some("2.0.0"));
        assert!(!manifest.versions.contains_key("1.0.0"));
        assert!(!manifest.time.contains_key("1.0.0"));
    }

    #[tokio::test]
    async fn test_foreign_bucket_events_ignored() {
        let store = MemoryStore::new();
        let mut event = upload(&store, "pkg", "1.0.0", 100);
        event.bucket = "other".to_string();
        let registry = registry(store);

        let outcome = process_event_batch(&registry, BUCKET, vec![event]).await;
        assert_eq!(outcome.packages, 0);
        assert!(registry.get_manifest("pkg").await.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_idempotent() {
        let store = MemoryStore::new();
        let event = upload(&store, "pkg", "1.0.0", 100);
        let registry = registry(store);

        process_event_batch(&registry, BUCKET, vec![event.clone()]).await;
        let first = registry.get_manifest("pkg").await.unwrap();

        process_event_batch(&registry, BUCKET, vec![event]).await;
        let second = registry.get_manifest("pkg").await.unwrap();

        assert_eq!(first, second);
    }
}
