//! Name mapping
//!
//! Turns inventory entries into the set of hostnames that should exist in the
//! record store.
//!
//! For entry `server1 -> 100.64.0.1` with suffixes `["ts", "vpn.example.com"]`:
//!
//! ```text
//! server1                 -> 100.64.0.1   (only with include_bare_hostname)
//! server1.ts              -> 100.64.0.1
//! server1.vpn.example.com -> 100.64.0.1
//! ```

use std::collections::HashMap;

use crate::config::NamingConfig;
use crate::traits::InventoryEntry;

/// Insertion-ordered hostname -> address mapping
///
/// Iteration follows first-insertion order so dry-run output is reproducible.
/// Re-inserting a hostname replaces its address in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredRecords {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl DesiredRecords {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a hostname, returning the previous address
    pub fn insert(&mut self, hostname: impl Into<String>, address: impl Into<String>) -> Option<String> {
        let hostname = hostname.into();
        let address = address.into();

        match self.index.get(&hostname) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, address)),
            None => {
                self.index.insert(hostname.clone(), self.entries.len());
                self.entries.push((hostname, address));
                None
            }
        }
    }

    /// Get the desired address for a hostname
    pub fn get(&self, hostname: &str) -> Option<&str> {
        self.index
            .get(hostname)
            .map(|&pos| self.entries[pos].1.as_str())
    }

    /// Whether a hostname is desired
    pub fn contains(&self, hostname: &str) -> bool {
        self.index.contains_key(hostname)
    }

    /// Number of desired hostnames
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no hostname is desired
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(hostname, address)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(h, a)| (h.as_str(), a.as_str()))
    }
}

impl<H: Into<String>, A: Into<String>> FromIterator<(H, A)> for DesiredRecords {
    fn from_iter<I: IntoIterator<Item = (H, A)>>(iter: I) -> Self {
        let mut records = Self::new();
        for (hostname, address) in iter {
            records.insert(hostname, address);
        }
        records
    }
}

/// Derives desired hostnames from inventory entries
#[derive(Debug, Clone)]
pub struct NameMapper {
    suffixes: Vec<String>,
    include_bare_hostname: bool,
}

impl NameMapper {
    /// Create a mapper
    ///
    /// Suffixes are trimmed and stripped of leading dots; empty suffixes are
    /// dropped.
    pub fn new<S: AsRef<str>>(suffixes: &[S], include_bare_hostname: bool) -> Self {
        let suffixes = suffixes
            .iter()
            .map(|s| s.as_ref().trim().trim_start_matches('.').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            suffixes,
            include_bare_hostname,
        }
    }

    /// Create a mapper from the naming configuration
    pub fn from_config(config: &NamingConfig) -> Self {
        Self::new(&config.suffixes, config.include_bare_hostname)
    }

    /// Suffixes in use after normalization
    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// Build the desired records
    ///
    /// Entries are processed in order; a later entry mapping to an existing
    /// hostname overwrites the earlier address. Entries lacking a name or an
    /// address are skipped.
    pub fn map<'a, I>(&self, entries: I) -> DesiredRecords
    where
        I: IntoIterator<Item = &'a InventoryEntry>,
    {
        let mut records = DesiredRecords::new();

        for entry in entries {
            if !entry.is_complete() {
                tracing::debug!(
                    "Skipping {} with missing name or address: {:?}",
                    entry.kind,
                    entry.name
                );
                continue;
            }

            if self.include_bare_hostname {
                self.insert(&mut records, entry.name.clone(), entry);
            }

            for suffix in &self.suffixes {
                self.insert(&mut records, format!("{}.{}", entry.name, suffix), entry);
            }
        }

        records
    }

    fn insert(&self, records: &mut DesiredRecords, hostname: String, entry: &InventoryEntry) {
        if let Some(previous) = records.insert(hostname.clone(), entry.address.clone()) {
            if previous != entry.address {
                tracing::debug!(
                    "{} overwritten by {} {}: {} -> {}",
                    hostname,
                    entry.kind,
                    entry.name,
                    previous,
                    entry.address
                );
            }
        }
    }
}
