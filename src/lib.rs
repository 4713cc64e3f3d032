//! npmreg: S3-backed npm registry core.
//!
//! This crate keeps one consolidated `package.json` manifest per package
//! inside an object store, synthesized from the per-version tarballs stored
//! next to it. The write side consumes object change notifications and
//! merges per-version deltas into the stored manifest; the read side can
//! resolve a manifest on demand when none has been materialized yet.

pub use npmreg_core::{
    sort_descending, PackageData, PackageDist, PackageManifest, PackageVersion, RegistryError,
    RegistryInfo, RegistryResult, SearchObject, SearchResponse, SemanticVersion, User,
    VersionRecord,
};

/// Configuration management.
pub mod config;

/// Change notification parsing, key conformance, and grouping.
pub mod events;

/// Manifest merge engine.
pub mod merge;

/// Batch processing pipeline.
pub mod pipeline;

/// Manifest write-back with per-package failure isolation.
pub mod publish;

/// On-demand manifest resolution, search, and the registry descriptor.
pub mod resolver;

/// Object store boundary and implementations.
pub mod store;

/// Tarball metadata extraction and checksums.
pub mod tarball;
