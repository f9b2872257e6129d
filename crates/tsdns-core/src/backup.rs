// # Backup Writer
//
// Writes a one-off JSON snapshot of a folder's rules before a live run.
//
// ## Purpose
//
// Manual recovery only. The snapshot is never read back by tsdns.
//
// ## File Format
//
// `<dir>/<prefix>_<YYYYMMDD_HHMMSS>.json`
//
// ```json
// {
//   "timestamp": "20250109_120000",
//   "profile_id": "abc123",
//   "folder_id": "42",
//   "folder_name": "Tailscale",
//   "rules": [
//     { "id": "server1.ts", "hostname": "server1.ts", "address": "100.64.0.1", "extra": {} }
//   ]
// }
// ```
//
// ## Atomicity
//
// The snapshot is written to a `.tmp` sibling and renamed into place, so a
// crash never leaves a truncated file under the final name.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::BackupConfig;
use crate::error::{Error, Result};
use crate::traits::{ExistingRule, Folder};

/// Timestamp layout used in file names and the snapshot body
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Serializable snapshot body
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BackupSnapshot {
    pub timestamp: String,
    pub profile_id: String,
    pub folder_id: String,
    pub folder_name: String,
    pub rules: Vec<ExistingRule>,
}

/// Writes timestamped rule snapshots
#[derive(Debug, Clone)]
pub struct BackupWriter {
    dir: PathBuf,
    prefix: String,
}

impl BackupWriter {
    /// Create a writer targeting `dir`
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Create a writer from the backup configuration
    pub fn from_config(config: &BackupConfig) -> Self {
        Self::new(config.dir.clone(), config.prefix.clone())
    }

    /// Path a snapshot taken at `timestamp` would be written to
    pub fn path_for(&self, timestamp: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.json", self.prefix, timestamp))
    }

    /// Write a snapshot of `rules` and return its path
    pub async fn write(
        &self,
        profile_id: &str,
        folder: &Folder,
        rules: &[ExistingRule],
    ) -> Result<PathBuf> {
        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();

        let snapshot = BackupSnapshot {
            timestamp: timestamp.clone(),
            profile_id: profile_id.to_string(),
            folder_id: folder.id.clone(),
            folder_name: folder.name.clone(),
            rules: rules.to_vec(),
        };

        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| Error::backup(format!("Failed to serialize snapshot: {}", e)))?;

        let path = self.path_for(&timestamp);
        Self::write_atomic(&path, json.as_bytes()).await?;

        tracing::info!("Backup created: {} ({} rules)", path.display(), rules.len());
        Ok(path)
    }

    async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
        let temp_path = path.with_extension("json.tmp");

        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::backup(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(contents).await.map_err(|e| {
                Error::backup(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::backup(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, path).await.map_err(|e| {
            Error::backup(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn folder() -> Folder {
        Folder {
            id: "42".to_string(),
            name: "Tailscale".to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let writer = BackupWriter::new(temp_dir.path(), "controld_backup");

        let mut rule = ExistingRule::new("server1.ts", "server1.ts", "100.64.0.1");
        rule.extra = serde_json::json!({ "PK": "server1.ts", "action": { "do": 2 } });

        let path = writer
            .write("prof123", &folder(), std::slice::from_ref(&rule))
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("controld_backup_"));
        assert!(name.ends_with(".json"));
        // controld_backup_YYYYMMDD_HHMMSS.json
        assert_eq!(name.len(), "controld_backup_".len() + 15 + ".json".len());

        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let snapshot: BackupSnapshot = serde_json::from_str(&content).unwrap();
        assert_eq!(snapshot.profile_id, "prof123");
        assert_eq!(snapshot.folder_id, "42");
        assert_eq!(snapshot.folder_name, "Tailscale");
        assert_eq!(snapshot.rules, vec![rule]);
        assert!(name.contains(&snapshot.timestamp));

        // No temp file left behind
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_write_into_missing_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let writer = BackupWriter::new(temp_dir.path().join("does/not/exist"), "bk");

        let result = writer.write("prof", &folder(), &[]).await;
        assert!(matches!(result, Err(Error::Backup(_))));
    }

    #[test]
    fn test_path_for() {
        let writer = BackupWriter::new("/var/backups", "controld_backup");
        assert_eq!(
            writer.path_for("20250109_120000"),
            PathBuf::from("/var/backups/controld_backup_20250109_120000.json")
        );
    }
}
