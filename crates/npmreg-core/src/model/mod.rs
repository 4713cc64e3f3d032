pub mod manifest;
pub mod package;
pub mod registry;
pub mod search;

pub use manifest::{PackageManifest, TAG_LATEST, TIME_CREATED, TIME_MODIFIED};
pub use package::{PackageData, PackageDist, PackageVersion, User, VersionRecord};
pub use registry::RegistryInfo;
pub use search::{SearchObject, SearchResponse};
