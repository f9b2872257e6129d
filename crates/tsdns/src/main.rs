// # tsdns - Tailscale to ControlD DNS sync
//
// This binary is a THIN integration layer only:
// 1. Parse the command line
// 2. Read configuration from environment variables
// 3. Build the Tailscale source and the ControlD store
// 4. Run one sync pass and print the summary
//
// All sync logic lives in tsdns-core.
//
// ## Configuration
//
// ### Tailscale
// - `TSDNS_TAILSCALE_API_KEY`: API key (required)
// - `TSDNS_TAILSCALE_TAILNET`: Tailnet identifier (default: `-`)
//
// ### ControlD
// - `TSDNS_CONTROLD_API_TOKEN`: API token (required)
// - `TSDNS_CONTROLD_PROFILE_ID`: Profile ID (required)
// - `TSDNS_CONTROLD_FOLDER`: Folder holding the rules (default: `Tailscale`)
//
// ### Naming
// - `TSDNS_DNS_SUFFIXES`: Comma-separated suffixes (default: `ts`)
// - `TSDNS_CREATE_BARE_HOSTNAME`: Also publish bare names (default: `false`)
//
// ### Backup
// - `TSDNS_BACKUP_DIR`: Snapshot directory (default: `.`)
// - `TSDNS_BACKUP_PREFIX`: Snapshot file prefix (default: `controld_backup`)
//
// ### Logging
// - `TSDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: `info`)
//
// ## Example
//
// ```bash
// export TSDNS_TAILSCALE_API_KEY=tskey-api-...
// export TSDNS_CONTROLD_API_TOKEN=api....
// export TSDNS_CONTROLD_PROFILE_ID=abc123
// export TSDNS_DNS_SUFFIXES=ts,vpn.example.com
//
// tsdns            # preview
// tsdns --apply    # apply
// ```

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;
use tsdns_core::{
    BackupConfig, InventoryConfig, NamingConfig, StoreConfig, SyncConfig, SyncMode, SyncOutcome,
    SyncRunner,
};
use tsdns_source_tailscale::TailscaleSource;
use tsdns_store_controld::ControlDStore;

/// Sync Tailscale devices and services to ControlD DNS rules
#[derive(Debug, Parser)]
#[command(name = "tsdns", about)]
struct Cli {
    /// Apply changes to ControlD (default is a dry run)
    #[arg(long)]
    apply: bool,

    /// Log at debug level, including API requests and responses
    #[arg(long)]
    debug: bool,
}

/// Exit codes for the possible run results
///
/// - 0: Run completed (individual record failures are reported, not fatal)
/// - 1: Configuration error, nothing was contacted
/// - 2: A precondition call failed, nothing was changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TsdnsExitCode {
    /// Run completed
    Success = 0,
    /// Missing or invalid configuration
    ConfigError = 1,
    /// Folder, inventory or rule fetch failed
    PreconditionError = 2,
}

impl From<TsdnsExitCode> for ExitCode {
    fn from(code: TsdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
#[derive(Debug)]
struct Config {
    sync: SyncConfig,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).unwrap_or_default();
        let var_or = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let include_bare_hostname = match lookup("TSDNS_CREATE_BARE_HOSTNAME") {
            Some(value) => parse_bool(&value)
                .with_context(|| "TSDNS_CREATE_BARE_HOSTNAME must be true or false")?,
            None => false,
        };

        let suffixes = match lookup("TSDNS_DNS_SUFFIXES") {
            Some(value) => parse_suffixes(&value),
            None => NamingConfig::default().suffixes,
        };

        let mut inventory = InventoryConfig::new(var("TSDNS_TAILSCALE_API_KEY"));
        inventory.tailnet = var_or("TSDNS_TAILSCALE_TAILNET", "-");

        let mut store = StoreConfig::new(
            var("TSDNS_CONTROLD_API_TOKEN"),
            var("TSDNS_CONTROLD_PROFILE_ID"),
        );
        store.folder_name = var_or("TSDNS_CONTROLD_FOLDER", &store.folder_name);

        let defaults = BackupConfig::default();
        let backup = BackupConfig {
            dir: lookup("TSDNS_BACKUP_DIR")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.dir),
            prefix: var_or("TSDNS_BACKUP_PREFIX", &defaults.prefix),
        };

        Ok(Self {
            sync: SyncConfig {
                inventory,
                store,
                naming: NamingConfig {
                    suffixes,
                    include_bare_hostname,
                },
                backup,
            },
            log_level: var_or("TSDNS_LOG_LEVEL", "info"),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        self.sync.validate()?;

        if self.sync.backup.prefix.contains(['/', '\\']) {
            anyhow::bail!(
                "TSDNS_BACKUP_PREFIX must be a file name prefix, not a path. Got: {}",
                self.sync.backup.prefix
            );
        }

        parse_level(&self.log_level).with_context(|| {
            format!(
                "TSDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            )
        })?;

        Ok(())
    }
}

/// Split a comma-separated suffix list, dropping blanks
fn parse_suffixes(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

fn parse_level(value: &str) -> Option<Level> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return TsdnsExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return TsdnsExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = if cli.debug {
        Level::DEBUG
    } else {
        parse_level(&config.log_level).unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return TsdnsExitCode::ConfigError.into();
    }

    let mode = SyncMode::from_apply_flag(cli.apply);
    info!("Starting tsdns ({})", mode);

    let source = match TailscaleSource::from_config(&config.sync.inventory) {
        Ok(source) => source,
        Err(e) => {
            error!("Failed to create Tailscale source: {}", e);
            return TsdnsExitCode::ConfigError.into();
        }
    };
    let store = match ControlDStore::from_config(&config.sync.store) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to create ControlD store: {}", e);
            return TsdnsExitCode::ConfigError.into();
        }
    };

    // One pass, every call awaited in order
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return TsdnsExitCode::PreconditionError.into();
        }
    };

    let runner = SyncRunner::new(&config.sync, &source, &store);
    match rt.block_on(runner.run(mode)) {
        Ok(outcome) => {
            print_summary(&outcome);
            TsdnsExitCode::Success.into()
        }
        Err(e) => {
            error!("Sync aborted: {}", e);
            TsdnsExitCode::PreconditionError.into()
        }
    }
}

/// Print the per-change lines and totals of a finished run
fn print_summary(outcome: &SyncOutcome) {
    let report = &outcome.report;
    let rule = "=".repeat(50);

    println!();
    println!(
        "Folder '{}' (ID: {}): {} devices, {} services, {} existing rules",
        outcome.folder.name,
        outcome.folder.id,
        outcome.devices,
        outcome.services,
        outcome.existing_rules
    );
    if let Some(path) = &outcome.backup {
        println!("Backup saved to {}", path.display());
    }
    println!("Desired records: {}", report.desired_total);

    println!();
    for change in &report.applied {
        println!("  {}", change);
    }
    for failure in &report.failures {
        println!("  FAILED {}: {}", failure.change, failure.error);
    }

    println!();
    println!("{}", rule);
    if report.mode.is_dry_run() {
        println!("DRY RUN Summary (no changes made):");
    } else {
        println!("Sync complete!");
    }
    println!("  Created:   {}", report.created);
    println!("  Updated:   {}", report.updated);
    println!("  Deleted:   {}", report.deleted);
    println!("  Unchanged: {}", report.unchanged);
    if report.has_failures() {
        println!("  Failed:    {}", report.failures.len());
    }
    println!("{}", rule);

    if report.mode.is_dry_run() && report.total_changes() > 0 {
        println!();
        println!("To apply these changes, run with --apply");
    }
}
