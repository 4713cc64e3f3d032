use chrono::{DateTime, Utc};
use npmreg_core::RegistryResult;

pub mod http;
pub mod memory;
pub mod registry;

pub use http::HttpObjectStore;
pub use memory::MemoryStore;
pub use registry::{manifest_key, RegistryStore, MANIFEST_FILE};

/// Summary entry returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

/// One page of a listing; `next_token` is present while more pages remain.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub objects: Vec<ObjectInfo>,
    pub next_token: Option<String>,
}

/// A fetched object.
#[derive(Debug, Clone)]
pub struct ObjectData {
    pub bytes: Vec<u8>,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

/// Checksum-enabled metadata for an object.
#[derive(Debug, Clone)]
pub struct ObjectStat {
    /// Lower-case hex SHA-1, when the store tracks one for the object.
    pub checksum: Option<String>,
    pub last_modified: DateTime<Utc>,
}

/// Durable blob store with prefix enumeration.
///
/// Not-found is `Ok(None)` on the read paths; `Err` means transport or
/// protocol failure. Continuation tokens are opaque and only valid for the
/// same prefix.
#[allow(async_fn_in_trait)]
pub trait ObjectStore: Send + Sync {
    async fn list(
        &self,
        prefix: Option<&str>,
        continuation: Option<&str>,
    ) -> RegistryResult<ObjectPage>;

    async fn get(&self, key: &str) -> RegistryResult<Option<ObjectData>>;

    async fn stat(&self, key: &str) -> RegistryResult<Option<ObjectStat>>;

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> RegistryResult<()>;
}
