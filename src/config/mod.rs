use npmreg_core::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Bucket holding version tarballs and package manifests
    #[serde(default)]
    pub bucket: String,

    /// Object store region, used for the default endpoint URL
    #[serde(default = "default_region")]
    pub region: String,

    /// Custom S3-compatible endpoint; the virtual-hosted bucket URL is
    /// derived from bucket + region when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Base URL advertised in `dist.tarball`; defaults to the endpoint URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_url: Option<String>,
}

fn default_region() -> String {
    "eu-central-1".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
            endpoint: None,
            public_url: None,
        }
    }
}

impl RegistryConfig {
    /// Load config from the platform config directory, creating a default
    /// file on first run.
    ///
    /// Locations:
    /// - Linux: ~/.config/npmreg/config.yaml
    /// - macOS: ~/Library/Application Support/npmreg/config.yaml
    /// - Windows: %APPDATA%\npmreg\config.yaml
    pub fn load() -> RegistryResult<Self> {
        let config_path = config_file()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = fs::read_to_string(&config_path)?;
        let config: RegistryConfig = serde_yaml::from_str(&content)
            .map_err(|e| RegistryError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save config to the platform config directory.
    pub fn save(&self) -> RegistryResult<()> {
        let config_path = config_file()?;
        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir)?;
        }

        let content = serde_yaml::to_string(self)
            .map_err(|e| RegistryError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Endpoint the store client talks to.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region),
        }
    }

    /// Base URL for public tarball links.
    pub fn tarball_base(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.endpoint_url(),
        }
    }
}

/// Config file path under the platform config directory.
pub fn config_file() -> RegistryResult<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| RegistryError::Config("Could not determine config directory".to_string()))?;
    Ok(config_dir.join("npmreg").join("config.yaml"))
}
