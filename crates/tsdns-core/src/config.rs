//! Configuration types for the tsdns system
//!
//! One [`SyncConfig`] is built at startup and passed by reference to the
//! adapters, the name mapper and the sync runner.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main sync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Inventory source (Tailscale) settings
    pub inventory: InventoryConfig,

    /// Record store (ControlD) settings
    pub store: StoreConfig,

    /// Hostname derivation rules
    #[serde(default)]
    pub naming: NamingConfig,

    /// Backup snapshot settings
    #[serde(default)]
    pub backup: BackupConfig,
}

impl SyncConfig {
    /// Validate the configuration
    ///
    /// Every missing or placeholder value is reported in a single error so the
    /// user can fix them all at once.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let mut missing = Vec::new();

        if is_placeholder(&self.inventory.api_key) {
            missing.push("inventory.api_key");
        }
        if is_placeholder(&self.inventory.tailnet) {
            missing.push("inventory.tailnet");
        }
        if is_placeholder(&self.store.api_token) {
            missing.push("store.api_token");
        }
        if is_placeholder(&self.store.profile_id) {
            missing.push("store.profile_id");
        }
        if self.store.folder_name.trim().is_empty() {
            missing.push("store.folder_name");
        }

        if !missing.is_empty() {
            return Err(crate::Error::config(format!(
                "missing or placeholder values: {}",
                missing.join(", ")
            )));
        }

        self.naming.validate()?;

        Ok(())
    }
}

/// Inventory source configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Tailscale API key
    pub api_key: String,

    /// Tailnet identifier (`-` selects the key's default tailnet)
    #[serde(default = "default_tailnet")]
    pub tailnet: String,
}

impl InventoryConfig {
    /// Create an inventory configuration for the key's default tailnet
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            tailnet: default_tailnet(),
        }
    }
}

impl std::fmt::Debug for InventoryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryConfig")
            .field("api_key", &"<REDACTED>")
            .field("tailnet", &self.tailnet)
            .finish()
    }
}

/// Record store configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// ControlD API token
    pub api_token: String,

    /// ControlD profile holding the rules
    pub profile_id: String,

    /// Display name of the folder the rules live in
    #[serde(default = "default_folder_name")]
    pub folder_name: String,
}

impl StoreConfig {
    /// Create a store configuration using the default folder name
    pub fn new(api_token: impl Into<String>, profile_id: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            profile_id: profile_id.into(),
            folder_name: default_folder_name(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("api_token", &"<REDACTED>")
            .field("profile_id", &self.profile_id)
            .field("folder_name", &self.folder_name)
            .finish()
    }
}

/// Hostname derivation rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
    /// DNS suffixes appended to every inventory name
    #[serde(default = "default_suffixes")]
    pub suffixes: Vec<String>,

    /// Also publish the name with no suffix
    #[serde(default)]
    pub include_bare_hostname: bool,
}

impl NamingConfig {
    /// Validate the naming rules
    ///
    /// A configuration that yields no hostnames would delete every rule in
    /// the folder, so it is rejected.
    pub fn validate(&self) -> Result<(), crate::Error> {
        let has_suffix = self.suffixes.iter().any(|s| !s.trim().is_empty());
        if !has_suffix && !self.include_bare_hostname {
            return Err(crate::Error::config(
                "no DNS suffixes configured and bare hostnames disabled; nothing would be published",
            ));
        }
        Ok(())
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            suffixes: default_suffixes(),
            include_bare_hostname: false,
        }
    }
}

/// Backup snapshot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Directory the snapshot is written to
    #[serde(default = "default_backup_dir")]
    pub dir: PathBuf,

    /// File name prefix, followed by `_<YYYYMMDD_HHMMSS>.json`
    #[serde(default = "default_backup_prefix")]
    pub prefix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            dir: default_backup_dir(),
            prefix: default_backup_prefix(),
        }
    }
}

/// Whether a credential or identifier still holds a template value
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    value.is_empty()
        || value.starts_with("your-")
        || value.starts_with("your_")
        || value.starts_with("tskey-api-xxxxx")
        || value.contains("replace_me")
        || value == "changeme"
}

fn default_tailnet() -> String {
    "-".to_string()
}

fn default_folder_name() -> String {
    "Tailscale".to_string()
}

fn default_suffixes() -> Vec<String> {
    vec!["ts".to_string()]
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_backup_prefix() -> String {
    "controld_backup".to_string()
}
