//! Credential store keyed by registry name
//!
//! The store is a JSON object mapping registry names to
//! `{"username": ..., "password": ...}`. It is written by `login` and only
//! read by the sync flow.

use crate::error::{MirrorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::Path;

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    /// True when neither a username nor a password is set
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }

    /// `user:pass` as the copy tool expects it
    pub fn to_flag_value(&self) -> String {
        format!("{}:{}", self.username, self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "***" })
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    entries: BTreeMap<String, Credentials>,
}

impl CredentialStore {
    /// Load the store; a missing or empty file is an empty store
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(MirrorError::Config(format!(
                    "read auth store {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        Self::from_json(&text)
            .map_err(|e| MirrorError::Config(format!("parse auth store {}: {}", path.display(), e)))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let entries: BTreeMap<String, Credentials> = serde_json::from_str(text)?;
        Ok(Self { entries })
    }

    pub fn get(&self, registry: &str) -> Option<&Credentials> {
        self.entries.get(registry)
    }

    pub fn insert(&mut self, registry: &str, credentials: Credentials) {
        self.entries.insert(registry.to_string(), credentials);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the store, creating the parent directory if needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.entries)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;

        // `mode` only applies on creation; tighten a pre-existing file first
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

/// Pick credentials for a registry
///
/// Credentials embedded in the config win when either field is set; otherwise
/// the stored entry is used; otherwise the registry is accessed anonymously.
pub fn resolve(registry: &str, inline: &Credentials, store: &CredentialStore) -> Credentials {
    if !inline.is_empty() {
        return inline.clone();
    }
    store.get(registry).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_credentials_override_store() {
        let mut store = CredentialStore::default();
        store.insert("source", Credentials::new("stored", "stored-pass"));

        let inline = Credentials::new("admin", "secret");
        assert_eq!(resolve("source", &inline, &store), inline);
    }

    #[test]
    fn test_store_used_when_config_has_none() {
        let mut store = CredentialStore::default();
        store.insert("source", Credentials::new("stored", "stored-pass"));

        let resolved = resolve("source", &Credentials::anonymous(), &store);
        assert_eq!(resolved, Credentials::new("stored", "stored-pass"));
    }

    #[test]
    fn test_username_only_inline_still_wins() {
        let mut store = CredentialStore::default();
        store.insert("source", Credentials::new("stored", "stored-pass"));

        let inline = Credentials::new("robot", "");
        assert_eq!(resolve("source", &inline, &store).username, "robot");
    }

    #[test]
    fn test_anonymous_when_nothing_known() {
        let resolved = resolve("other", &Credentials::anonymous(), &CredentialStore::default());
        assert!(resolved.is_empty());
    }

    #[test]
    fn test_missing_and_empty_files_are_empty_stores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        assert!(CredentialStore::load(&path).unwrap().is_empty());

        std::fs::write(&path, "").unwrap();
        assert!(CredentialStore::load(&path).unwrap().is_empty());

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(CredentialStore::load(&path), Err(MirrorError::Config(_))));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("auth.json");

        let mut store = CredentialStore::default();
        store.insert("target", Credentials::new("u", "p"));
        store.save(&path).unwrap();

        let loaded = CredentialStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.get("target"), Some(&Credentials::new("u", "p")));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let mut store = CredentialStore::default();
        store.insert("target", Credentials::new("u", "p"));
        store.save(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let fresh = dir.path().join("new").join("auth.json");
        store.save(&fresh).unwrap();
        let mode = std::fs::metadata(&fresh).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_debug_redacts_password() {
        let text = format!("{:?}", Credentials::new("u", "hunter2"));
        assert!(!text.contains("hunter2"));
    }
}
