//! Folder resolution
//!
//! Maps the configured folder display name to the store's folder identifier,
//! creating the folder on first use.

use crate::error::{Error, Result};
use crate::traits::{Folder, RecordStore};
use tracing::info;

/// Find a folder by name (case-insensitive) or create it
///
/// Errors from listing or creating are returned as-is; without a folder
/// there is nothing to reconcile against.
pub async fn resolve_folder(store: &dyn RecordStore, name: &str) -> Result<Folder> {
    let wanted = name.trim();
    let wanted_key = wanted.to_lowercase();
    let folders = store.list_folders().await?;

    if let Some(folder) = folders
        .into_iter()
        .find(|f| f.name.trim().to_lowercase() == wanted_key)
    {
        info!("Found existing folder: {} ({})", folder.name, folder.id);
        return Ok(folder);
    }

    info!("Creating folder: {}", wanted);
    let folder = store.create_folder(wanted).await?;

    if folder.id.is_empty() {
        return Err(Error::invalid_response(format!(
            "{} returned no identifier for new folder {}",
            store.store_name(),
            wanted
        )));
    }

    info!("Created folder: {} ({})", folder.name, folder.id);
    Ok(folder)
}
