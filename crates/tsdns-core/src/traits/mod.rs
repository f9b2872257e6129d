//! Core traits for the tsdns system
//!
//! This module defines the abstract interfaces that adapters implement.
//!
//! - [`InventorySource`]: Read the authoritative host inventory
//! - [`RecordStore`]: Read and mutate DNS rules in a folder

pub mod inventory_source;
pub mod record_store;

pub use inventory_source::{EntryKind, InventoryEntry, InventorySource};
pub use record_store::{ExistingRule, Folder, RecordStore};
