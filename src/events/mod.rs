use indexmap::IndexMap;
use npmreg_core::RegistryResult;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Version object keys look like `{package}/{name}-M.N.P.tgz`.
const VERSION_KEY_PATTERN: &str = r"^[A-Za-z0-9.\-]+/[A-Za-z0-9.\-]+-[0-9]+\.[0-9]+\.[0-9]+\.tgz$";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Removed,
}

impl EventKind {
    fn from_event_name(name: &str) -> Option<Self> {
        if name.starts_with("ObjectCreated") {
            Some(EventKind::Created)
        } else if name.starts_with("ObjectRemoved") {
            Some(EventKind::Removed)
        } else {
            None
        }
    }
}

/// One object creation or removal reported by the store.
///
/// The kind records what the store claimed happened; the pipeline re-reads
/// current store state per key rather than trusting it, which is what makes
/// out-of-order and duplicate delivery safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    pub bucket: String,
    pub key: String,
    pub kind: EventKind,
}

#[derive(Debug, Deserialize)]
struct RawBatch {
    #[serde(rename = "Records", default)]
    records: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "eventName", default)]
    event_name: String,
    s3: RawEntity,
}

#[derive(Debug, Deserialize)]
struct RawEntity {
    bucket: RawBucket,
    object: RawObject,
}

#[derive(Debug, Deserialize)]
struct RawBucket {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawObject {
    key: String,
}

/// Parse a raw store notification batch.
///
/// Object keys arrive URL-encoded with `+` for spaces and are decoded here.
/// Records with an unrecognized event name are dropped.
pub fn parse_notification_batch(json: &str) -> RegistryResult<Vec<ChangeNotification>> {
    let raw: RawBatch = serde_json::from_str(json)?;

    let mut notifications = Vec::new();
    for record in raw.records {
        let Some(kind) = EventKind::from_event_name(&record.event_name) else {
            debug!("Skipping record with event name {:?}", record.event_name);
            continue;
        };
        notifications.push(ChangeNotification {
            bucket: record.s3.bucket.name,
            key: decode_key(&record.s3.object.key),
            kind,
        });
    }

    Ok(notifications)
}

fn decode_key(raw: &str) -> String {
    let plussed = raw.replace('+', " ");
    match urlencoding::decode(&plussed) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn version_key_regex() -> &'static Regex {
    static VERSION_KEY_RE: OnceLock<Regex> = OnceLock::new();
    VERSION_KEY_RE.get_or_init(|| {
        Regex::new(VERSION_KEY_PATTERN).expect("version key pattern is valid")
    })
}

/// Whether a key names a version tarball object.
pub fn conforms(key: &str) -> bool {
    if version_key_regex().is_match(key) {
        return true;
    }

    info!("Key {} does not conform to the package object format", key);
    false
}

/// First path segment of an object key.
pub fn package_name(key: &str) -> &str {
    key.split('/').next().unwrap_or("")
}

/// Trailing `M.N.P` of a version object key, between the last `-` and the
/// `.tgz` extension.
pub fn package_version(key: &str) -> &str {
    let file_name = key.rsplit('/').next().unwrap_or("");
    let stem = file_name.strip_suffix(".tgz").unwrap_or(file_name);
    stem.rsplit('-').next().unwrap_or("")
}

/// Partition conforming records by package.
///
/// Package order is first-seen; record order within a package is input
/// order. Non-conforming keys are logged and dropped.
pub fn group_by_package(
    notifications: Vec<ChangeNotification>,
) -> IndexMap<String, Vec<ChangeNotification>> {
    let mut groups: IndexMap<String, Vec<ChangeNotification>> = IndexMap::new();
    for notification in notifications {
        if !conforms(&notification.key) {
            continue;
        }
        groups
            .entry(package_name(&notification.key).to_string())
            .or_default()
            .push(notification);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created(bucket: &str, key: &str) -> ChangeNotification {
        ChangeNotification {
            bucket: bucket.to_string(),
            key: key.to_string(),
            kind: EventKind::Created,
        }
    }

    #[test]
    fn test_conforms() {
        assert!(conforms("left-pad/left-pad-1.0.0.tgz"));
        assert!(conforms("my.pkg/my.pkg-10.2.33.tgz"));
        assert!(!conforms("bad-name.tgz"));
        assert!(!conforms("left-pad/package.json"));
        assert!(!conforms("left-pad/left-pad-1.0.tgz"));
        assert!(!conforms("left-pad/left-pad-1.0.0.tgz.bak"));
        assert!(!conforms("a/b/left-pad-1.0.0.tgz"));
    }

    #[test]
    fn test_key_parts() {
        let key = "left-pad/left-pad-1.0.0.tgz";
        assert_eq!(package_name(key), "left-pad");
        assert_eq!(package_version(key), "1.0.0");

        // Dashes in the package name stay with the name.
        assert_eq!(package_version("is-thirteen/is-thirteen-2.1.3.tgz"), "2.1.3");
    }

    #[test]
    fn test_group_by_package_orders() {
        let groups = group_by_package(vec![
            created("b", "beta/beta-1.0.0.tgz"),
            created("b", "alpha/alpha-1.0.0.tgz"),
            created("b", "beta/beta-2.0.0.tgz"),
            created("b", "junk.tgz"),
        ]);

        let packages: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(packages, vec!["beta", "alpha"]);
        let beta_keys: Vec<_> = groups["beta"].iter().map(|n| n.key.clone()).collect();
        assert_eq!(
            beta_keys,
            vec!["beta/beta-1.0.0.tgz", "beta/beta-2.0.0.tgz"]
        );
    }

    #[test]
    fn test_parse_notification_batch() {
        let json = r#"{
            "Records": [
                {
                    "eventName": "ObjectCreated:Put",
                    "s3": {
                        "bucket": {"name": "packages"},
                        "object": {"key": "left-pad/left-pad-1.0.0.tgz"}
                    }
                },
                {
                    "eventName": "ObjectRemoved:Delete",
                    "s3": {
                        "bucket": {"name": "packages"},
                        "object": {"key": "left-pad/left-pad-0.9.0.tgz"}
                    }
                },
                {
                    "eventName": "TestEvent",
                    "s3": {
                        "bucket": {"name": "packages"},
                        "object": {"key": "ignored"}
                    }
                }
            ]
        }"#;

        let notifications = parse_notification_batch(json).unwrap();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].kind, EventKind::Created);
        assert_eq!(notifications[0].key, "left-pad/left-pad-1.0.0.tgz");
        assert_eq!(notifications[1].kind, EventKind::Removed);
    }

    #[test]
    fn test_parse_decodes_keys() {
        let json = r#"{
            "Records": [
                {
                    "eventName": "ObjectCreated:Put",
                    "s3": {
                        "bucket": {"name": "packages"},
                        "object": {"key": "left-pad/left-pad-1.0.0.tgz"}
                    }
                }
            ]
        }"#
        .replace("left-pad/left", "left-pad%2Fleft");

        let notifications = parse_notification_batch(&json).unwrap();
        assert_eq!(notifications[0].key, "left-pad/left-pad-1.0.0.tgz");
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(parse_notification_batch("{").is_err());
    }
}
