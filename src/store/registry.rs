use crate::config::RegistryConfig;
use crate::store::{ObjectData, ObjectInfo, ObjectStat, ObjectStore};
use npmreg_core::{PackageManifest, RegistryResult};
use tracing::{info, warn};

/// File name of the materialized manifest within a package prefix.
pub const MANIFEST_FILE: &str = "package.json";

/// Upper bound on listing pages followed per enumeration. Guards against
/// runaway pagination independent of any wall-clock timeout.
const LIST_PAGE_LIMIT: usize = 1000;

/// Storage key of a package's materialized manifest.
pub fn manifest_key(package: &str) -> String {
    format!("{}/{}", package, MANIFEST_FILE)
}

/// Bucket-scoped manifest store client.
///
/// Wraps an [`ObjectStore`] with the registry's read/write conventions:
/// capped paged listings that degrade to partial data on transport errors,
/// manifest reads that treat not-found and unparseable alike (the manifest
/// will be rebuilt), and per-object fetches that never abort a batch.
pub struct RegistryStore<S> {
    store: S,
    tarball_base: String,
}

impl<S: ObjectStore> RegistryStore<S> {
    pub fn new(store: S, config: &RegistryConfig) -> Self {
        Self {
            store,
            tarball_base: config.tarball_base(),
        }
    }

    /// Public download URL for a stored tarball key.
    pub fn tarball_url(&self, key: &str) -> String {
        format!("{}/{}", self.tarball_base, key)
    }

    /// The wrapped object store.
    pub fn backing_store(&self) -> &S {
        &self.store
    }

    /// Enumerate objects under a prefix, following continuation tokens up
    /// to [`LIST_PAGE_LIMIT`] pages. A transport error aborts the loop and
    /// returns whatever was collected so far.
    pub async fn list_objects(&self, prefix: Option<&str>) -> Vec<ObjectInfo> {
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        for _ in 0..LIST_PAGE_LIMIT {
            match self.store.list(prefix, token.as_deref()).await {
                Ok(page) => {
                    objects.extend(page.objects);
                    match page.next_token {
                        Some(next) => token = Some(next),
                        None => break,
                    }
                }
                Err(e) => {
                    warn!("Error occurred while trying to list objects in store: {}", e);
                    break;
                }
            }
        }

        objects
    }

    /// All objects under `{package}/`.
    pub async fn list_version_objects(&self, package: &str) -> Vec<ObjectInfo> {
        self.list_objects(Some(&format!("{}/", package))).await
    }

    /// The materialized manifest for a package, or None when it is absent
    /// or unreadable.
    pub async fn get_manifest(&self, package: &str) -> Option<PackageManifest> {
        let key = manifest_key(package);
        let data = match self.store.get(&key).await {
            Ok(Some(data)) => data,
            Ok(None) => {
                info!("Package manifest {} not found in store", key);
                return None;
            }
            Err(e) => {
                warn!("Unable to read package manifest {}: {}", key, e);
                return None;
            }
        };

        match serde_json::from_slice(&data.bytes) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!("Unable to parse package manifest {}: {}", key, e);
                None
            }
        }
    }

    /// Fetch a version object; any failure is reported as absence.
    pub async fn get_version_object(&self, key: &str) -> Option<ObjectData> {
        match self.store.get(key).await {
            Ok(Some(data)) => Some(data),
            Ok(None) => {
                info!("Package object {} not found in store", key);
                None
            }
            Err(e) => {
                info!("Package object {} was not downloaded: {}", key, e);
                None
            }
        }
    }

    /// Checksum-enabled metadata lookup; failures are reported as absence.
    pub async fn stat_object(&self, key: &str) -> Option<ObjectStat> {
        match self.store.stat(key).await {
            Ok(stat) => stat,
            Err(e) => {
                info!("Unable to stat package object {}: {}", key, e);
                None
            }
        }
    }

    /// Serialize and write a package manifest.
    pub async fn put_manifest(
        &self,
        package: &str,
        manifest: &PackageManifest,
    ) -> RegistryResult<()> {
        let body = serde_json::to_vec(manifest)?;
        self.store
            .put(&manifest_key(package), body, "application/json")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::{DateTime, Utc};

    fn ts(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).unwrap()
    }

    fn registry(store: MemoryStore) -> RegistryStore<MemoryStore> {
        let config = RegistryConfig {
            bucket: "packages".to_string(),
            ..Default::default()
        };
        RegistryStore::new(store, &config)
    }

    #[test]
    fn test_manifest_key() {
        assert_eq!(manifest_key("left-pad"), "left-pad/package.json");
    }

    #[test]
    fn test_tarball_url() {
        let registry = registry(MemoryStore::new());
        assert_eq!(
            registry.tarball_url("left-pad/left-pad-1.0.0.tgz"),
            "https://packages.s3.eu-central-1.amazonaws.com/left-pad/left-pad-1.0.0.tgz"
        );
    }

    #[tokio::test]
    async fn test_list_version_objects_follows_pages() {
        let store = MemoryStore::new().with_page_size(2);
        for i in 0..5 {
            store.put_object(&format!("p/p-1.0.{}.tgz", i), vec![i], ts(i as i64));
        }
        store.put_object("other/other-1.0.0.tgz", vec![9], ts(9));

        let registry = registry(store);
        let objects = registry.list_version_objects("p").await;
        assert_eq!(objects.len(), 5);
        assert!(objects.iter().all(|o| o.key.starts_with("p/")));
    }

    #[tokio::test]
    async fn test_get_manifest_absent_and_garbage() {
        let store = MemoryStore::new();
        store.put_object("broken/package.json", b"not json".to_vec(), ts(0));
        let registry = registry(store);

        assert!(registry.get_manifest("missing").await.is_none());
        assert!(registry.get_manifest("broken").await.is_none());
    }

    #[tokio::test]
    async fn test_put_then_get_manifest_roundtrip() {
        let registry = registry(MemoryStore::new());
        let manifest = PackageManifest {
            id: "left-pad".to_string(),
            name: "left-pad".to_string(),
            ..Default::default()
        };

        registry.put_manifest("left-pad", &manifest).await.unwrap();
        let loaded = registry.get_manifest("left-pad").await.unwrap();
        assert_eq!(loaded.name, "left-pad");
        assert_eq!(loaded, manifest);
    }
}
