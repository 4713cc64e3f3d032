// Core functionality
pub mod core;

// Wire and storage models
pub mod model;

// Re-export commonly used types
pub use core::{sort_descending, RegistryError, RegistryResult, SemanticVersion};
pub use model::{
    PackageData, PackageDist, PackageManifest, PackageVersion, RegistryInfo, SearchObject,
    SearchResponse, User, VersionRecord, TAG_LATEST, TIME_CREATED, TIME_MODIFIED,
};
