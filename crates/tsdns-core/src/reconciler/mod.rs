//! Reconciliation between desired hostnames and existing rules
//!
//! The reconciler is responsible for:
//! - Computing the minimal set of changes between two hostname-keyed maps
//! - Applying those changes to a [`RecordStore`], one at a time
//! - Isolating per-record failures so one bad rule cannot block the run
//!
//! ## Flow
//!
//! ```text
//! ┌────────────────┐     ┌────────────────┐
//! │ DesiredRecords │     │ ExistingRules  │
//! └────────────────┘     └────────────────┘
//!          │                      │
//!          └──────────┬───────────┘
//!                     ▼
//!               ┌──────────┐
//!               │  plan()  │  pure diff
//!               └──────────┘
//!                     │ SyncPlan
//!                     ▼
//!              ┌─────────────┐
//!              │ Reconciler  │──── create / update / delete ───▶ RecordStore
//!              └─────────────┘      (skipped in dry-run)
//!                     │
//!                     ▼
//!                SyncReport
//! ```
//!
//! ## Dry-Run
//!
//! In dry-run mode every change is reported as successful without touching
//! the store. Plan and counts are otherwise identical to apply mode.

use std::collections::HashMap;

use crate::error::Result;
use crate::mapper::DesiredRecords;
use crate::traits::{ExistingRule, RecordStore};
use tracing::{debug, error, info, warn};

/// Execution mode for a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Compute and report changes without contacting the store
    #[default]
    DryRun,
    /// Apply changes to the store
    Apply,
}

impl SyncMode {
    /// Select the mode from the `--apply` switch
    pub fn from_apply_flag(apply: bool) -> Self {
        if apply { SyncMode::Apply } else { SyncMode::DryRun }
    }

    /// Whether mutations are skipped
    pub fn is_dry_run(&self) -> bool {
        matches!(self, SyncMode::DryRun)
    }
}

impl std::fmt::Display for SyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncMode::DryRun => write!(f, "DRY RUN"),
            SyncMode::Apply => write!(f, "LIVE"),
        }
    }
}

/// Existing rules keyed by hostname, in store order
#[derive(Debug, Clone, Default)]
pub struct ExistingRules {
    rules: Vec<ExistingRule>,
    index: HashMap<String, usize>,
}

impl ExistingRules {
    /// Index rules by hostname
    ///
    /// The store is expected to keep hostnames unique within a folder. If it
    /// does not, the last rule wins and a warning is logged.
    pub fn from_rules(rules: impl IntoIterator<Item = ExistingRule>) -> Self {
        let mut existing = Self::default();

        for rule in rules {
            match existing.index.get(&rule.hostname) {
                Some(&pos) => {
                    warn!(
                        "Duplicate rule for {} (ids {} and {}), keeping the latter",
                        rule.hostname, existing.rules[pos].id, rule.id
                    );
                    existing.rules[pos] = rule;
                }
                None => {
                    existing.index.insert(rule.hostname.clone(), existing.rules.len());
                    existing.rules.push(rule);
                }
            }
        }

        existing
    }

    /// Look up the rule for a hostname
    pub fn get(&self, hostname: &str) -> Option<&ExistingRule> {
        self.index.get(hostname).map(|&pos| &self.rules[pos])
    }

    /// Number of distinct hostnames
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the folder holds no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterate rules in store order
    pub fn iter(&self) -> impl Iterator<Item = &ExistingRule> {
        self.rules.iter()
    }
}

/// Kind of a planned change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

/// One mutation against the record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// Hostname is desired but has no rule
    Create { hostname: String, address: String },

    /// Hostname has a rule pointing elsewhere
    Update {
        rule_id: String,
        hostname: String,
        previous_address: String,
        address: String,
    },

    /// Rule exists for a hostname that is no longer desired
    Delete {
        rule_id: String,
        hostname: String,
        address: String,
    },
}

impl Change {
    /// Hostname affected by the change
    pub fn hostname(&self) -> &str {
        match self {
            Change::Create { hostname, .. }
            | Change::Update { hostname, .. }
            | Change::Delete { hostname, .. } => hostname,
        }
    }

    /// Kind of change
    pub fn kind(&self) -> ChangeKind {
        match self {
            Change::Create { .. } => ChangeKind::Create,
            Change::Update { .. } => ChangeKind::Update,
            Change::Delete { .. } => ChangeKind::Delete,
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Change::Create { hostname, address } => write!(f, "create {hostname} -> {address}"),
            Change::Update {
                hostname,
                previous_address,
                address,
                ..
            } => write!(f, "update {hostname} -> {address} (was {previous_address})"),
            Change::Delete { hostname, .. } => write!(f, "delete {hostname}"),
        }
    }
}

/// Ordered set of changes computed by [`plan`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Creates and updates in desired order, then deletes in store order
    pub changes: Vec<Change>,
    /// Hostnames whose rule already matches
    pub unchanged: Vec<String>,
    /// Number of desired hostnames the plan was computed from
    pub desired_total: usize,
}

impl SyncPlan {
    /// Whether the store already matches
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes of the given kind
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind() == kind).count()
    }
}

/// Compute the changes that make `existing` match `desired`
///
/// Pure: no I/O, deterministic for a given input order.
pub fn plan(desired: &DesiredRecords, existing: &ExistingRules) -> SyncPlan {
    let mut sync_plan = SyncPlan {
        desired_total: desired.len(),
        ..SyncPlan::default()
    };

    for (hostname, address) in desired.iter() {
        match existing.get(hostname) {
            Some(rule) if rule.address == address => {
                sync_plan.unchanged.push(hostname.to_string());
            }
            Some(rule) => sync_plan.changes.push(Change::Update {
                rule_id: rule.id.clone(),
                hostname: hostname.to_string(),
                previous_address: rule.address.clone(),
                address: address.to_string(),
            }),
            None => sync_plan.changes.push(Change::Create {
                hostname: hostname.to_string(),
                address: address.to_string(),
            }),
        }
    }

    for rule in existing.iter() {
        if !desired.contains(&rule.hostname) {
            sync_plan.changes.push(Change::Delete {
                rule_id: rule.id.clone(),
                hostname: rule.hostname.clone(),
                address: rule.address.clone(),
            });
        }
    }

    sync_plan
}

/// A change the store rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedChange {
    pub change: Change,
    pub error: String,
}

/// Outcome of applying a plan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub mode: SyncMode,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub desired_total: usize,
    /// Changes that succeeded (or would have, in dry-run)
    pub applied: Vec<Change>,
    /// Changes the store rejected
    pub failures: Vec<FailedChange>,
}

impl SyncReport {
    /// Number of successful creates, updates and deletes
    pub fn total_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    /// Whether any change failed
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn record_success(&mut self, change: Change) {
        match change.kind() {
            ChangeKind::Create => self.created += 1,
            ChangeKind::Update => self.updated += 1,
            ChangeKind::Delete => self.deleted += 1,
        }
        self.applied.push(change);
    }
}

/// Applies sync plans to a record store
///
/// Changes are executed sequentially in plan order. A failing change is
/// logged, recorded in the report and skipped; it is never retried.
pub struct Reconciler<'a> {
    /// Store receiving the mutations
    store: &'a dyn RecordStore,

    /// Folder the rules live in
    folder_id: String,

    /// Dry-run or apply
    mode: SyncMode,
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler for one folder
    pub fn new(store: &'a dyn RecordStore, folder_id: impl Into<String>, mode: SyncMode) -> Self {
        Self {
            store,
            folder_id: folder_id.into(),
            mode,
        }
    }

    /// Plan and apply in one step
    pub async fn reconcile(&self, desired: &DesiredRecords, existing: &ExistingRules) -> SyncReport {
        let sync_plan = plan(desired, existing);
        debug!(
            "Planned {} create(s), {} update(s), {} delete(s), {} unchanged",
            sync_plan.count(ChangeKind::Create),
            sync_plan.count(ChangeKind::Update),
            sync_plan.count(ChangeKind::Delete),
            sync_plan.unchanged.len()
        );
        self.apply(sync_plan).await
    }

    /// Apply a previously computed plan
    pub async fn apply(&self, sync_plan: SyncPlan) -> SyncReport {
        let mut report = SyncReport {
            mode: self.mode,
            unchanged: sync_plan.unchanged.len(),
            desired_total: sync_plan.desired_total,
            ..SyncReport::default()
        };

        for hostname in &sync_plan.unchanged {
            debug!("Unchanged: {}", hostname);
        }

        for change in sync_plan.changes {
            match self.execute(&change).await {
                Ok(()) => {
                    info!(
                        "{}{}",
                        if self.mode.is_dry_run() { "[DRY-RUN] " } else { "" },
                        change
                    );
                    report.record_success(change);
                }
                Err(e) => {
                    error!("Failed to {}: {}", change, e);
                    report.failures.push(FailedChange {
                        change,
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    /// Perform a single change against the store
    async fn execute(&self, change: &Change) -> Result<()> {
        if self.mode.is_dry_run() {
            return Ok(());
        }

        match change {
            Change::Create { hostname, address } => {
                self.store
                    .create_rule(&self.folder_id, hostname, address)
                    .await
            }
            Change::Update {
                rule_id,
                hostname,
                address,
                ..
            } => {
                self.store
                    .update_rule(rule_id, &self.folder_id, hostname, address)
                    .await
            }
            Change::Delete { rule_id, .. } => self.store.delete_rule(rule_id).await,
        }
    }
}
