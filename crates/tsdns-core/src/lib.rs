// # tsdns-core
//
// Core library for syncing tailnet hosts into DNS rewrite rules.
//
// ## Architecture Overview
//
// - **InventorySource**: Trait for reading the authoritative host inventory
// - **RecordStore**: Trait for reading and mutating DNS rules in a folder
// - **NameMapper**: Derives desired hostnames from inventory entries
// - **Reconciler**: Computes and applies the minimal create/update/delete diff
// - **SyncRunner**: Sequences one complete pass against injected adapters
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Diff logic is separate from HTTP adapters
// 2. **One-directional**: The inventory is ground truth; the store follows
// 3. **Library-First**: Nothing below the binary terminates the process
// 4. **Dry-run parity**: Dry-run computes exactly what apply would do

pub mod backup;
pub mod config;
pub mod error;
pub mod folder;
pub mod mapper;
pub mod reconciler;
pub mod sync;
pub mod traits;

// Re-export core types for convenience
pub use backup::{BackupSnapshot, BackupWriter};
pub use config::{BackupConfig, InventoryConfig, NamingConfig, StoreConfig, SyncConfig};
pub use error::{Error, Result};
pub use folder::resolve_folder;
pub use mapper::{DesiredRecords, NameMapper};
pub use reconciler::{
    Change, ChangeKind, ExistingRules, FailedChange, Reconciler, SyncMode, SyncPlan, SyncReport,
    plan,
};
pub use sync::{SyncOutcome, SyncRunner};
pub use traits::{EntryKind, ExistingRule, Folder, InventoryEntry, InventorySource, RecordStore};
