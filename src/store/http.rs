use crate::config::RegistryConfig;
use crate::store::{ObjectData, ObjectInfo, ObjectPage, ObjectStat, ObjectStore};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use npmreg_core::{RegistryError, RegistryResult};
use regex::Regex;
use reqwest::header::{CONTENT_TYPE, ETAG, LAST_MODIFIED};
use reqwest::{Client, StatusCode};
use tracing::debug;

/// S3-compatible object store over plain HTTP.
///
/// Speaks the REST dialect every S3-compatible service understands:
/// `?list-type=2` listings with continuation tokens, GET/HEAD/PUT on object
/// keys, and the `x-amz-checksum-sha1` metadata header. Listing responses
/// are XML; the handful of fields needed here are pulled out with regexes
/// rather than a full XML stack.
pub struct HttpObjectStore {
    client: Client,
    base_url: String,
    contents_re: Regex,
    key_re: Regex,
    modified_re: Regex,
    token_re: Regex,
}

impl HttpObjectStore {
    pub fn new(config: &RegistryConfig) -> RegistryResult<Self> {
        if config.bucket.is_empty() && config.endpoint.is_none() {
            return Err(RegistryError::Config(
                "no bucket or endpoint configured".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            base_url: config.endpoint_url(),
            contents_re: listing_regex(r"(?s)<Contents>(.*?)</Contents>")?,
            key_re: listing_regex(r"<Key>([^<]*)</Key>")?,
            modified_re: listing_regex(r"<LastModified>([^<]*)</LastModified>")?,
            token_re: listing_regex(r"<NextContinuationToken>([^<]*)</NextContinuationToken>")?,
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn listing_url(&self, prefix: Option<&str>, continuation: Option<&str>) -> String {
        let mut url = format!("{}/?list-type=2", self.base_url);
        if let Some(prefix) = prefix {
            url.push_str("&prefix=");
            url.push_str(&urlencoding::encode(prefix));
        }
        if let Some(token) = continuation {
            url.push_str("&continuation-token=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }

    fn parse_listing(&self, body: &str) -> ObjectPage {
        let mut objects = Vec::new();
        for entry in self.contents_re.captures_iter(body) {
            let block = &entry[1];
            let key = match self.key_re.captures(block) {
                Some(found) => xml_unescape(&found[1]),
                None => continue,
            };
            let last_modified = self
                .modified_re
                .captures(block)
                .and_then(|found| parse_timestamp(&found[1]))
                .unwrap_or_else(Utc::now);
            objects.push(ObjectInfo { key, last_modified });
        }

        let next_token = self
            .token_re
            .captures(body)
            .map(|found| xml_unescape(&found[1]));

        ObjectPage {
            objects,
            next_token,
        }
    }
}

fn listing_regex(pattern: &str) -> RegistryResult<Regex> {
    Regex::new(pattern).map_err(|e| RegistryError::Config(format!("Invalid regex pattern: {}", e)))
}

/// Undo the XML escaping S3 applies to keys and tokens.
fn xml_unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

fn header_timestamp(response: &reqwest::Response) -> DateTime<Utc> {
    response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now)
}

fn header_etag(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_matches('"').to_string())
        .unwrap_or_default()
}

impl ObjectStore for HttpObjectStore {
    async fn list(
        &self,
        prefix: Option<&str>,
        continuation: Option<&str>,
    ) -> RegistryResult<ObjectPage> {
        let url = self.listing_url(prefix, continuation);
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(RegistryError::Store(format!(
                "listing failed with status {}",
                response.status()
            )));
        }
        let body = response.text().await?;
        Ok(self.parse_listing(&body))
    }

    async fn get(&self, key: &str) -> RegistryResult<Option<ObjectData>> {
        let response = self.client.get(self.object_url(key)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RegistryError::Store(format!(
                "get {} failed with status {}",
                key,
                response.status()
            )));
        }

        let etag = header_etag(&response);
        let last_modified = header_timestamp(&response);
        let bytes = response.bytes().await?.to_vec();

        Ok(Some(ObjectData {
            bytes,
            etag,
            last_modified,
        }))
    }

    async fn stat(&self, key: &str) -> RegistryResult<Option<ObjectStat>> {
        let response = self
            .client
            .head(self.object_url(key))
            .header("x-amz-checksum-mode", "ENABLED")
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(RegistryError::Store(format!(
                "stat {} failed with status {}",
                key,
                response.status()
            )));
        }

        // The checksum header is base64; the registry wire format is hex.
        let checksum = response
            .headers()
            .get("x-amz-checksum-sha1")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| match BASE64.decode(value) {
                Ok(bytes) => Some(hex::encode(bytes)),
                Err(e) => {
                    debug!("undecodable checksum header for {}: {}", key, e);
                    None
                }
            });

        Ok(Some(ObjectStat {
            checksum,
            last_modified: header_timestamp(&response),
        }))
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> RegistryResult<()> {
        let response = self
            .client
            .put(self.object_url(key))
            .header(CONTENT_TYPE, content_type)
            .body(bytes)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(RegistryError::Store(format!(
                "put {} failed with status {}",
                key,
                response.status()
            )));
        }
        Ok(())
    }
}
