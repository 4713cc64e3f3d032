use crate::store::{ObjectData, ObjectInfo, ObjectPage, ObjectStat, ObjectStore};
use chrono::{DateTime, Utc};
use npmreg_core::{RegistryError, RegistryResult};
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// In-process object store.
///
/// Backs tests and local experimentation. Listing is lexicographic like a
/// real bucket; the page size is configurable so pagination loops can be
/// exercised.
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    page_size: usize,
}

#[derive(Debug, Clone)]
struct StoredObject {
    bytes: Vec<u8>,
    last_modified: DateTime<Utc>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            page_size: 1000,
        }
    }

    /// Listing page size; lower it to force multi-page enumerations.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Seed an object with an explicit timestamp.
    pub fn put_object(&self, key: &str, bytes: Vec<u8>, last_modified: DateTime<Utc>) {
        self.lock().insert(
            key.to_string(),
            StoredObject {
                bytes,
                last_modified,
            },
        );
    }

    /// Delete an object; missing keys are a no-op.
    pub fn remove_object(&self, key: &str) {
        self.lock().remove(key);
    }

    /// Raw bytes of a stored object, for test assertions.
    pub fn object_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.lock().get(key).map(|o| o.bytes.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, StoredObject>> {
        match self.objects.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn shasum(bytes: &[u8]) -> String {
        hex::encode(Sha1::digest(bytes))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for MemoryStore {
    async fn list(
        &self,
        prefix: Option<&str>,
        continuation: Option<&str>,
    ) -> RegistryResult<ObjectPage> {
        let objects = self.lock();
        let mut page = Vec::new();
        let mut next_token = None;

        for (key, object) in objects.iter() {
            if let Some(prefix) = prefix {
                if !key.starts_with(prefix) {
                    continue;
                }
            }
            // Tokens resume strictly after the last key of the prior page.
            if let Some(token) = continuation {
                if key.as_str() <= token {
                    continue;
                }
            }
            if page.len() == self.page_size {
                next_token = page.last().map(|info: &ObjectInfo| info.key.clone());
                break;
            }
            page.push(ObjectInfo {
                key: key.clone(),
                last_modified: object.last_modified,
            });
        }

        Ok(ObjectPage {
            objects: page,
            next_token,
        })
    }

    async fn get(&self, key: &str) -> RegistryResult<Option<ObjectData>> {
        Ok(self.lock().get(key).map(|object| ObjectData {
            bytes: object.bytes.clone(),
            etag: Self::shasum(&object.bytes),
            last_modified: object.last_modified,
        }))
    }

    async fn stat(&self, key: &str) -> RegistryResult<Option<ObjectStat>> {
        Ok(self.lock().get(key).map(|object| ObjectStat {
            checksum: Some(Self::shasum(&object.bytes)),
            last_modified: object.last_modified,
        }))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> RegistryResult<()> {
        if content_type.is_empty() {
            return Err(RegistryError::Store(
                "content type must not be empty".to_string(),
            ));
        }
        self.put_object(key, bytes, Utc::now());
        Ok(())
    }
}
