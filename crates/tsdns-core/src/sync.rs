//! One complete sync pass
//!
//! [`SyncRunner`] sequences a run in a fixed order:
//!
//! 1. Resolve (or create) the folder
//! 2. Fetch devices, then services
//! 3. Fetch the folder's existing rules
//! 4. Write a backup snapshot (apply mode, non-empty folder only)
//! 5. Build desired records, plan, apply
//!
//! Steps 1-3 are preconditions: any error aborts the run and is returned.
//! Backup failures are logged and ignored. Per-record failures end up in the
//! returned [`SyncReport`].

use std::path::PathBuf;

use crate::backup::BackupWriter;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::folder::resolve_folder;
use crate::mapper::NameMapper;
use crate::reconciler::{ExistingRules, Reconciler, SyncMode, SyncReport};
use crate::traits::{Folder, InventorySource, RecordStore};
use tracing::{info, warn};

/// Everything a run produced, for the caller to print
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    /// Folder the rules were reconciled in
    pub folder: Folder,
    /// Devices reported by the inventory source
    pub devices: usize,
    /// Services reported by the inventory source
    pub services: usize,
    /// Rules found in the folder before the run
    pub existing_rules: usize,
    /// Snapshot written before mutating, if any
    pub backup: Option<PathBuf>,
    /// Reconciliation result
    pub report: SyncReport,
}

/// Drives a single sync pass against injected adapters
pub struct SyncRunner<'a> {
    config: &'a SyncConfig,
    source: &'a dyn InventorySource,
    store: &'a dyn RecordStore,
}

impl<'a> SyncRunner<'a> {
    /// Create a runner
    pub fn new(
        config: &'a SyncConfig,
        source: &'a dyn InventorySource,
        store: &'a dyn RecordStore,
    ) -> Self {
        Self {
            config,
            source,
            store,
        }
    }

    /// Run one pass in the given mode
    pub async fn run(&self, mode: SyncMode) -> Result<SyncOutcome> {
        info!(
            "Starting {} -> {} sync ({})",
            self.source.source_name(),
            self.store.store_name(),
            mode
        );

        let folder = resolve_folder(self.store, &self.config.store.folder_name).await?;

        let devices = self.source.list_devices().await?;
        info!("Found {} devices", devices.len());

        let services = self.source.list_services().await?;
        info!("Found {} services", services.len());

        let rules = self.store.list_rules(&folder.id).await?;
        info!("Found {} existing rules in '{}'", rules.len(), folder.name);

        let backup = if !mode.is_dry_run() && !rules.is_empty() {
            self.write_backup(&folder, &rules).await
        } else {
            None
        };

        let desired = NameMapper::from_config(&self.config.naming)
            .map(devices.iter().chain(services.iter()));
        info!("Generated {} desired DNS records", desired.len());

        let existing_rules = rules.len();
        let existing = ExistingRules::from_rules(rules);

        let report = Reconciler::new(self.store, folder.id.clone(), mode)
            .reconcile(&desired, &existing)
            .await;

        if report.has_failures() {
            warn!(
                "{} change(s) failed; store may be partially reconciled",
                report.failures.len()
            );
        }

        Ok(SyncOutcome {
            folder,
            devices: devices.len(),
            services: services.len(),
            existing_rules,
            backup,
            report,
        })
    }

    async fn write_backup(
        &self,
        folder: &Folder,
        rules: &[crate::traits::ExistingRule],
    ) -> Option<PathBuf> {
        let writer = BackupWriter::from_config(&self.config.backup);
        match writer.write(&self.config.store.profile_id, folder, rules).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Could not create backup: {}", e);
                None
            }
        }
    }
}
