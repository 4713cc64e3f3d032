use crate::model::package::PackageVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One search hit: the latest version record of a matching package.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchObject {
    pub package: PackageVersion,
}

/// Response shape of the `/-/v1/search` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub objects: Vec<SearchObject>,
    pub total: usize,
    pub time: DateTime<Utc>,
}

impl SearchResponse {
    pub fn new(objects: Vec<SearchObject>) -> Self {
        Self {
            total: objects.len(),
            objects,
            time: Utc::now(),
        }
    }
}
