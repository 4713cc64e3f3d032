use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An author or maintainer identity as it appears in a package descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub name: String,
    pub email: String,
}

/// Descriptor fields shared by every layer of the data model.
///
/// This is the `package.json` found inside a tarball. The same value is
/// embedded in per-version records and echoed into manifest-level scalar
/// fields, so it is kept as one composed struct rather than a hierarchy.
/// Unknown fields in the descriptor are ignored; missing fields default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageData {
    pub name: String,
    pub version: String,
    pub description: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub author: User,
    pub license: String,
    pub category: String,
    pub keywords: Vec<String>,
    pub dependencies: HashMap<String, String>,
    pub scripts: HashMap<String, String>,
    pub main: String,
    pub maintainers: Vec<User>,
    pub readme: String,
    #[serde(rename = "readmeFilename")]
    pub readme_filename: String,
}

/// Distribution pointers for one published version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageDist {
    /// Lower-case hex SHA-1 of the compressed tarball bytes.
    pub shasum: String,
    /// Public download URL of the tarball.
    pub tarball: String,
}

/// One version entry as persisted inside a manifest's `versions` map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageVersion {
    /// `{package}@{version}`; empty on records recovered straight from a
    /// tarball, populated by the on-demand resolver.
    #[serde(rename = "_id", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(flatten)]
    pub data: PackageData,
    pub dist: PackageDist,
}

/// A per-version record paired with the storage timestamp of its tarball.
///
/// The timestamp feeds the manifest `time` map and is never serialized as
/// part of the record itself. Immutable per object key: a re-upload yields
/// a new record with fresh content and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRecord {
    pub package: PackageVersion,
    pub last_modified: DateTime<Utc>,
}

impl VersionRecord {
    /// Version string as declared by the embedded descriptor.
    pub fn version(&self) -> &str {
        &self.package.data.version
    }

    /// Storage timestamp rendered for `time` map entries.
    pub fn timestamp(&self) -> String {
        self.last_modified.to_rfc3339()
    }
}
