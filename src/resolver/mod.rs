use crate::events;
use crate::store::{ObjectInfo, ObjectStore, RegistryStore, MANIFEST_FILE};
use crate::tarball;
use indexmap::IndexMap;
use npmreg_core::{
    sort_descending, PackageData, PackageDist, PackageManifest, PackageVersion, RegistryError,
    RegistryInfo, RegistryResult, SearchObject, SearchResponse, SemanticVersion, TAG_LATEST,
    TIME_CREATED, TIME_MODIFIED,
};
use tracing::info;

/// Synthesize a package manifest live from the version objects present.
///
/// Read-path fallback for packages whose manifest has not been materialized
/// by the write-side pipeline. Returns `Ok(None)` when the package has no
/// version objects at all (the read API maps that to not-found); a manifest
/// is only ever returned fully built, never partially.
///
/// Per-version checksums are looked up through checksum metadata, one round
/// trip per listed object; output shape matches a materialized manifest.
pub async fn resolve_package<S: ObjectStore>(
    store: &RegistryStore<S>,
    package: &str,
) -> RegistryResult<Option<PackageManifest>> {
    let mut objects: Vec<ObjectInfo> = store
        .list_version_objects(package)
        .await
        .into_iter()
        .filter(|object| events::conforms(&object.key))
        .collect();
    if objects.is_empty() {
        return Ok(None);
    }

    sort_descending(&mut objects, |object| {
        SemanticVersion::parse(events::package_version(&object.key))
            .unwrap_or(SemanticVersion::new(0, 0, 0))
    });

    let newest = &objects[0];
    let latest_version = events::package_version(&newest.key).to_string();
    let data = store.get_version_object(&newest.key).await.ok_or_else(|| {
        RegistryError::Store(format!(
            "unable to download latest package object {}",
            newest.key
        ))
    })?;
    let etag = data.etag.clone();
    let latest =
        tarball::extract_version_record(&data.bytes, store.tarball_url(&newest.key), data.last_modified)?;
    let descriptor = latest.package.data;

    let mut shasums: IndexMap<String, String> = IndexMap::new();
    for object in &objects {
        shasums.insert(object.key.clone(), object_shasum(store, &object.key).await?);
    }

    // Objects are in descending version order: first is newest, last oldest.
    let mut time = IndexMap::new();
    for object in &objects {
        time.insert(
            events::package_version(&object.key).to_string(),
            object.last_modified.to_rfc3339(),
        );
    }
    if let Some(oldest) = objects.last() {
        time.insert(TIME_CREATED.to_string(), oldest.last_modified.to_rfc3339());
    }
    time.insert(TIME_MODIFIED.to_string(), newest.last_modified.to_rfc3339());

    let mut versions = IndexMap::new();
    for object in &objects {
        let version = events::package_version(&object.key).to_string();
        let shasum = shasums.get(&object.key).cloned().unwrap_or_default();
        versions.insert(
            version.clone(),
            PackageVersion {
                id: format!("{}@{}", package, version),
                data: PackageData {
                    name: package.to_string(),
                    version,
                    description: descriptor.description.clone(),
                    author: descriptor.author.clone(),
                    license: descriptor.license.clone(),
                    main: descriptor.main.clone(),
                    maintainers: descriptor.maintainers.clone(),
                    scripts: descriptor.scripts.clone(),
                    ..Default::default()
                },
                dist: PackageDist {
                    shasum,
                    tarball: store.tarball_url(&object.key),
                },
            },
        );
    }

    Ok(Some(PackageManifest {
        id: package.to_string(),
        name: package.to_string(),
        description: descriptor.description,
        display_name: descriptor.display_name,
        author: descriptor.author,
        license: descriptor.license,
        category: descriptor.category,
        dist_tags: IndexMap::from([(TAG_LATEST.to_string(), latest_version)]),
        time,
        versions,
        etag,
        ..Default::default()
    }))
}

/// SHA-1 for one stored object, preferring checksum metadata and falling
/// back to downloading and hashing the object.
async fn object_shasum<S: ObjectStore>(
    store: &RegistryStore<S>,
    key: &str,
) -> RegistryResult<String> {
    if let Some(stat) = store.stat_object(key).await {
        if let Some(checksum) = stat.checksum {
            return Ok(checksum);
        }
    }

    let data = store.get_version_object(key).await.ok_or_else(|| {
        RegistryError::Store(format!("unable to read object {} for its checksum", key))
    })?;
    Ok(tarball::shasum(&data.bytes))
}

/// Search materialized manifests by substring of their storage key.
///
/// Pages through the whole bucket, loads every `package.json`, and reports
/// each package's latest version record. An empty or missing query matches
/// everything.
pub async fn search_packages<S: ObjectStore>(
    store: &RegistryStore<S>,
    text: Option<&str>,
) -> SearchResponse {
    let mut hits = Vec::new();

    for object in store.list_objects(None).await {
        let Some(package) = object
            .key
            .strip_suffix(MANIFEST_FILE)
            .and_then(|prefix| prefix.strip_suffix('/'))
        else {
            continue;
        };
        if let Some(needle) = text {
            if !needle.trim().is_empty() && !object.key.contains(needle) {
                continue;
            }
        }

        let Some(manifest) = store.get_manifest(package).await else {
            info!("Package manifest {} not found", object.key);
            continue;
        };
        match manifest.latest_record() {
            Some(record) => hits.push(SearchObject {
                package: record.clone(),
            }),
            None => {
                info!(
                    "Package manifest {} has no record for its latest tag",
                    object.key
                );
            }
        }
    }

    SearchResponse::new(hits)
}

/// Static registry descriptor for the root endpoint.
pub fn registry_info() -> RegistryInfo {
    RegistryInfo::default()
}
