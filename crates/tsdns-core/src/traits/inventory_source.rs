// # Inventory Source Trait
//
// Defines the interface for reading the authoritative host inventory.
//
// ## Implementations
//
// - Tailscale: `tsdns-source-tailscale` crate
//
// ## Usage
//
// ```rust,ignore
// use tsdns_core::InventorySource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* InventorySource implementation */;
//
//     for entry in source.list_devices().await? {
//         println!("{} -> {}", entry.name, entry.address);
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// What kind of inventory object an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A machine in the tailnet
    Device,
    /// A named service published in the tailnet
    Service,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Device => write!(f, "device"),
            EntryKind::Service => write!(f, "service"),
        }
    }
}

/// One named host reported by the inventory source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Normalized name (lower-cased; devices keep only their first label)
    pub name: String,
    /// Address the name should resolve to
    pub address: String,
    /// Origin of the entry
    pub kind: EntryKind,
}

impl InventoryEntry {
    /// Create a device entry
    ///
    /// Device names are reported fully qualified (`laptop.tail1234.ts.net`);
    /// only the first label is kept.
    pub fn device(raw_name: &str, address: impl Into<String>) -> Self {
        let name = raw_name
            .trim()
            .split('.')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        Self {
            name,
            address: address.into().trim().to_string(),
            kind: EntryKind::Device,
        }
    }

    /// Create a service entry
    pub fn service(raw_name: &str, address: impl Into<String>) -> Self {
        Self {
            name: raw_name.trim().to_lowercase(),
            address: address.into().trim().to_string(),
            kind: EntryKind::Service,
        }
    }

    /// Whether the entry has both a name and an address
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.address.is_empty()
    }
}

/// Trait for inventory source implementations
///
/// An inventory source is read-only ground truth. It is queried once per run
/// and never mutated.
///
/// Implementations perform one API call per method invocation and return
/// errors instead of retrying; the caller decides whether a failure is fatal.
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// List all devices in the tailnet
    ///
    /// Entries with no address are still returned; filtering happens in the
    /// name mapper.
    async fn list_devices(&self) -> Result<Vec<InventoryEntry>, crate::Error>;

    /// List all services in the tailnet
    async fn list_services(&self) -> Result<Vec<InventoryEntry>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
