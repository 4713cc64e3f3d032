use indexmap::IndexMap;
use npmreg_core::{PackageManifest, VersionRecord, TAG_LATEST, TIME_CREATED, TIME_MODIFIED};

/// Outcome for one version touched by a batch.
///
/// A version whose object could not be fetched or extracted carries no
/// record: if it was previously present this removes it, otherwise it is a
/// no-op.
#[derive(Debug, Clone)]
pub enum VersionDelta {
    Record(VersionRecord),
    Removed,
}

/// Fold the existing manifest, the freshly re-resolved latest record, and
/// the batch's per-version deltas into the next manifest state.
///
/// `latest` must be re-resolved from the objects currently present (a batch
/// may have removed the previous latest). When it is None the merge is
/// skipped entirely and the caller leaves any prior manifest untouched.
///
/// Deltas are applied in input order; a later delta for the same version
/// wins. The input manifest is never mutated.
pub fn update_manifest(
    existing: &PackageManifest,
    latest: Option<&VersionRecord>,
    deltas: &[(String, VersionDelta)],
) -> Option<PackageManifest> {
    let latest = latest?;
    let latest_version = latest.version().to_string();
    let latest_modified = latest.timestamp();

    // `created`/`modified` are seeded exactly once, at first-ever manifest
    // creation, and left alone afterwards.
    let mut time = if existing.time.is_empty() {
        IndexMap::from([
            (TIME_CREATED.to_string(), latest_modified.clone()),
            (TIME_MODIFIED.to_string(), latest_modified.clone()),
        ])
    } else {
        existing.time.clone()
    };
    time.insert(latest_version.clone(), latest_modified);
    for (version, delta) in deltas {
        match delta {
            VersionDelta::Removed => {
                time.shift_remove(version);
            }
            VersionDelta::Record(record) => {
                time.insert(version.clone(), record.timestamp());
            }
        }
    }

    let mut versions = existing.versions.clone();
    versions.insert(latest_version.clone(), latest.package.clone());
    for (version, delta) in deltas {
        match delta {
            VersionDelta::Removed => {
                versions.shift_remove(version);
            }
            VersionDelta::Record(record) => {
                versions.insert(version.clone(), record.package.clone());
            }
        }
    }

    let data = &latest.package.data;
    let mut manifest = PackageManifest {
        id: data.name.clone(),
        name: data.name.clone(),
        description: data.description.clone(),
        display_name: data.display_name.clone(),
        author: data.author.clone(),
        license: data.license.clone(),
        category: data.category.clone(),
        dist_tags: IndexMap::from([(TAG_LATEST.to_string(), latest_version)]),
        time,
        versions,
        ..Default::default()
    };
    manifest.sort_versions_descending();

    Some(manifest)
}
