//! Configuration management module
//!
//! The YAML config names every registry the tool talks to and points at the
//! copy tool. Rules and stored credentials live in their own files and are
//! handled by the [`rules`] and [`credentials`] submodules.

pub mod credentials;
pub mod rules;

use crate::copy::RuntimeMode;
use crate::error::{MirrorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use credentials::{CredentialStore, Credentials};
pub use rules::{ProjectRule, RulesFile};

/// `copy_tool_path` value that selects containerized invocation
pub const CONTAINER_SENTINEL: &str = "docker";

pub const DEFAULT_AUTH_STORE: &str = ".airgap-mirror/auth.json";
pub const DEFAULT_COPY_TOOL: &str = "skopeo";
pub const DEFAULT_COPY_IMAGE: &str = "quay.io/skopeo/stable";
pub const DEFAULT_CATALOG_TIMEOUT_SECS: u64 = 60;

pub const ENV_COPY_TOOL: &str = "AIRGAP_MIRROR_COPY_TOOL";
pub const ENV_AUTH_STORE: &str = "AIRGAP_MIRROR_AUTH_STORE";

/// One registry endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Legacy single URL, used when `api_url` or `registry_url` is unset
    pub url: String,
    /// Catalog API base URL
    pub api_url: String,
    /// Host the copy tool pulls from / pushes to
    pub registry_url: String,
    pub insecure: bool,
    pub username: String,
    pub password: String,
}

impl RegistryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    pub fn with_credentials(mut self, username: &str, password: &str) -> Self {
        self.username = username.to_string();
        self.password = password.to_string();
        self
    }

    /// Base URL for catalog discovery
    pub fn api_base(&self) -> &str {
        if self.api_url.trim().is_empty() {
            self.url.trim()
        } else {
            self.api_url.trim()
        }
    }

    /// Registry address used in image references, without scheme
    pub fn registry_host(&self) -> &str {
        let address = if self.registry_url.trim().is_empty() {
            self.url.trim()
        } else {
            self.registry_url.trim()
        };
        trim_scheme(address).trim_end_matches('/')
    }

    pub fn inline_credentials(&self) -> Credentials {
        Credentials::new(&self.username, &self.password)
    }
}

/// Strip a leading `http://` or `https://`
pub fn trim_scheme(address: &str) -> &str {
    address
        .strip_prefix("http://")
        .or_else(|| address.strip_prefix("https://"))
        .unwrap_or(address)
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Credential store path; relative paths resolve under the home directory
    pub auth_store: String,
    /// Copy tool binary, or `docker` to run it in a container
    pub copy_tool_path: String,
    /// Image used for containerized copies
    pub copy_image: String,
    pub catalog_timeout_sec: u64,
    pub registries: BTreeMap<String, RegistryConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth_store: DEFAULT_AUTH_STORE.to_string(),
            copy_tool_path: DEFAULT_COPY_TOOL.to_string(),
            copy_image: DEFAULT_COPY_IMAGE.to_string(),
            catalog_timeout_sec: DEFAULT_CATALOG_TIMEOUT_SECS,
            registries: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Read, parse, apply environment overrides and validate
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            MirrorError::Config(format!("read config {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&text)
            .map_err(|e| MirrorError::Config(format!("{}: {}", path.display(), e)))?
            .apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse YAML, filling blank fields with defaults
    pub fn from_yaml(text: &str) -> Result<Self> {
        let mut config: AppConfig = serde_yaml_ng::from_str(text)?;
        let defaults = AppConfig::default();

        if config.auth_store.trim().is_empty() {
            config.auth_store = defaults.auth_store;
        }
        if config.copy_tool_path.trim().is_empty() {
            config.copy_tool_path = defaults.copy_tool_path;
        }
        if config.copy_image.trim().is_empty() {
            config.copy_image = defaults.copy_image;
        }
        if config.catalog_timeout_sec == 0 {
            config.catalog_timeout_sec = defaults.catalog_timeout_sec;
        }

        Ok(config)
    }

    /// Override file settings from environment variables
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override file settings from `lookup`; blank values are ignored
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(val) = value(ENV_COPY_TOOL) {
            self.copy_tool_path = val;
        }
        if let Some(val) = value(ENV_AUTH_STORE) {
            self.auth_store = val;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, registry) in &self.registries {
            if registry.api_base().is_empty() && registry.registry_host().is_empty() {
                return Err(MirrorError::Config(format!(
                    "registry {:?}: one of url, api_url or registry_url must be set",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Look up a registry by name
    pub fn registry(&self, name: &str) -> Result<&RegistryConfig> {
        self.registries
            .get(name)
            .ok_or_else(|| MirrorError::Config(format!("registry {:?} not found in config", name)))
    }

    pub fn auth_store_path(&self) -> Result<PathBuf> {
        let path = PathBuf::from(&self.auth_store);
        if path.is_absolute() {
            return Ok(path);
        }
        let home = dirs::home_dir().ok_or_else(|| {
            MirrorError::Config("cannot resolve home directory for auth_store".to_string())
        })?;
        Ok(home.join(path))
    }

    /// Credentials for `name`: inline config first, then the store
    pub fn credentials_for(&self, name: &str, store: &CredentialStore) -> Credentials {
        let inline = self
            .registries
            .get(name)
            .map(RegistryConfig::inline_credentials)
            .unwrap_or_default();
        credentials::resolve(name, &inline, store)
    }

    pub fn runtime_mode(&self, network: Option<String>) -> RuntimeMode {
        if self.copy_tool_path.eq_ignore_ascii_case(CONTAINER_SENTINEL) {
            RuntimeMode::Container {
                runtime: self.copy_tool_path.clone(),
                image: self.copy_image.clone(),
                network: network.filter(|n| !n.trim().is_empty()),
            }
        } else {
            RuntimeMode::Direct {
                program: self.copy_tool_path.clone(),
            }
        }
    }
}
