// # Record Store Trait
//
// Defines the interface for reading and mutating DNS rules kept in a named
// folder of the DNS service.
//
// ## Implementations
//
// - ControlD: `tsdns-store-controld` crate
//
// ## Usage
//
// ```rust,ignore
// use tsdns_core::RecordStore;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* RecordStore implementation */;
//
//     let folder = store.create_folder("Tailscale").await?;
//     store.create_rule(&folder.id, "server1.ts", "100.64.0.1").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A named grouping of rules in the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    /// Store-assigned identifier
    pub id: String,
    /// Display name
    pub name: String,
}

/// One rule currently held in the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExistingRule {
    /// Store-assigned identifier, required for update and delete
    pub id: String,
    /// Hostname the rule answers for
    pub hostname: String,
    /// Address the hostname resolves to
    pub address: String,
    /// Raw store payload, kept for backup snapshots
    #[serde(default)]
    pub extra: serde_json::Value,
}

impl ExistingRule {
    /// Create a rule with no raw payload attached
    pub fn new(
        id: impl Into<String>,
        hostname: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            hostname: hostname.into(),
            address: address.into(),
            extra: serde_json::Value::Null,
        }
    }
}

/// Trait for record store implementations
///
/// Implementations must be stateless: one API call per method invocation, no
/// caching between calls and no retry logic. A failed call returns an error;
/// the reconciler decides whether it is fatal or skipped.
///
/// Dry-run is not the store's concern. The reconciler never calls a mutating
/// method in dry-run mode.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// List all folders in the profile
    async fn list_folders(&self) -> Result<Vec<Folder>, crate::Error>;

    /// Create a folder and return it with its new identifier
    async fn create_folder(&self, name: &str) -> Result<Folder, crate::Error>;

    /// List the rules stored in a folder
    async fn list_rules(&self, folder_id: &str) -> Result<Vec<ExistingRule>, crate::Error>;

    /// Create a rule in a folder
    async fn create_rule(
        &self,
        folder_id: &str,
        hostname: &str,
        address: &str,
    ) -> Result<(), crate::Error>;

    /// Point an existing rule at a new address
    async fn update_rule(
        &self,
        rule_id: &str,
        folder_id: &str,
        hostname: &str,
        address: &str,
    ) -> Result<(), crate::Error>;

    /// Delete a rule
    async fn delete_rule(&self, rule_id: &str) -> Result<(), crate::Error>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}
