use serde::{Deserialize, Serialize};

/// Static registry descriptor served at the registry root.
///
/// npm clients probe this CouchDB-style document; the counters are not
/// tracked by this registry and stay zeroed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryInfo {
    pub db_name: String,
    pub doc_count: u64,
    pub doc_del_count: u64,
    pub update_seq: u64,
    pub purge_seq: u64,
    pub compact_running: bool,
    pub disk_size: u64,
    pub data_size: u64,
    pub instance_start_time: String,
    pub disk_format_version: u32,
    pub committed_update_seq: u64,
}

impl Default for RegistryInfo {
    fn default() -> Self {
        Self {
            db_name: "npmreg".to_string(),
            doc_count: 0,
            doc_del_count: 0,
            update_seq: 0,
            purge_seq: 0,
            compact_running: false,
            disk_size: 0,
            data_size: 0,
            instance_start_time: String::new(),
            disk_format_version: 0,
            committed_update_seq: 0,
        }
    }
}
