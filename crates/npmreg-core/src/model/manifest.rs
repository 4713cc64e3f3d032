use crate::core::version::SemanticVersion;
use crate::model::package::{PackageVersion, User};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Dist-tag pointing at the newest version.
pub const TAG_LATEST: &str = "latest";

/// `time` map key for the first-ever manifest creation timestamp.
pub const TIME_CREATED: &str = "created";

/// `time` map key for the last modification timestamp.
pub const TIME_MODIFIED: &str = "modified";

/// Consolidated per-package manifest, persisted as `{package}/package.json`.
///
/// The object store owns the only durable copy. The merge engine works on a
/// cloned value and produces a new manifest to write back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageManifest {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub author: User,
    pub license: String,
    pub provider: String,
    pub category: String,
    #[serde(rename = "dist-tags")]
    pub dist_tags: IndexMap<String, String>,
    /// Version string (or "created"/"modified") to RFC 3339 timestamp.
    pub time: IndexMap<String, String>,
    /// Version string to version record, kept in descending version order.
    pub versions: IndexMap<String, PackageVersion>,
    pub etag: String,
}

impl Default for PackageManifest {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            display_name: String::new(),
            author: User::default(),
            license: String::new(),
            provider: "npmreg".to_string(),
            category: String::new(),
            dist_tags: IndexMap::new(),
            time: IndexMap::new(),
            versions: IndexMap::new(),
            etag: String::new(),
        }
    }
}

impl PackageManifest {
    /// The version string the "latest" dist-tag points at, if any.
    pub fn latest_version(&self) -> Option<&str> {
        self.dist_tags.get(TAG_LATEST).map(String::as_str)
    }

    /// The version record the "latest" dist-tag points at, if present.
    pub fn latest_record(&self) -> Option<&PackageVersion> {
        self.versions.get(self.latest_version()?)
    }

    /// Re-order the `versions` map by descending semantic version.
    ///
    /// Every key is expected to parse; a key that does not is sorted last.
    /// The sort is stable, so output order is reproducible.
    pub fn sort_versions_descending(&mut self) {
        self.versions.sort_by(|ka, _, kb, _| {
            match (SemanticVersion::parse(ka).ok(), SemanticVersion::parse(kb).ok()) {
                (Some(a), Some(b)) => b.cmp(&a),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
    }
}
