//! Shared status file read by the dashboard
//!
//! Every monitor process does read-modify-write of the whole JSON array. Writes are
//! serialized with an advisory lock when one can be taken. Without it a concurrent
//! write can be lost, which the owning monitor repairs on its next poll.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::MonitorError;
use crate::filesys::file::File;
use crate::filesys::lock::{FileLock, LockGuard};
use crate::models::status::{SharedStatusEntry, StatusUpdate};

/// One monitor's handle on the shared status file
#[derive(Debug, Clone)]
pub struct StatusStore {
    file: Option<File>,
    slug: String,
    version: String,
}

impl StatusStore {
    /// `status_file` of `None` turns every update into a no-op
    pub fn new(status_file: Option<PathBuf>, slug: &str, version: &str) -> Self {
        Self {
            file: status_file.map(File::new),
            slug: slug.to_string(),
            version: version.to_string(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.file.as_ref().map(|f| f.path())
    }

    /// Merge `update` into this product's entry, creating it if needed
    ///
    /// Never fails: I/O problems are logged and the monitor carries on.
    pub async fn update(&self, product_id: &str, update: &StatusUpdate) {
        let Some(file) = &self.file else {
            return;
        };
        if let Err(e) = self.try_update(file, product_id, update).await {
            warn!(
                "Failed to update status file {}: {}",
                file.path().display(),
                e
            );
        }
    }

    async fn try_update(
        &self,
        file: &File,
        product_id: &str,
        update: &StatusUpdate,
    ) -> Result<(), MonitorError> {
        let _guard = acquire_lock(file.path()).await;

        let mut entries = read_raw(file).await;
        let now = Utc::now();

        let matches: Vec<usize> = entries
            .iter()
            .enumerate()
            .filter(|(_, v)| entry_product_id(v).as_deref() == Some(product_id))
            .map(|(i, _)| i)
            .collect();

        let seed = SharedStatusEntry::seed(product_id, &self.slug, &self.version, now);
        match matches.split_first() {
            Some((&first, duplicates)) => {
                if let Value::Object(entry) = &mut entries[first] {
                    fill_missing(entry, &seed)?;
                    update.merge_into(entry, now)?;
                }
                for &index in duplicates.iter().rev() {
                    entries.remove(index);
                }
            }
            None => {
                let mut entry = Map::new();
                fill_missing(&mut entry, &seed)?;
                update.merge_into(&mut entry, now)?;
                entries.push(Value::Object(entry));
            }
        }

        file.write_json(&entries).await?;
        debug!("Status file updated for product {}", product_id);
        Ok(())
    }

    /// Every readable entry in the file; unreadable entries are skipped
    pub async fn read_all(&self) -> Vec<SharedStatusEntry> {
        let Some(file) = &self.file else {
            return Vec::new();
        };
        read_raw(file)
            .await
            .into_iter()
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect()
    }

    /// This product's entry, if present
    pub async fn read_entry(&self, product_id: &str) -> Option<SharedStatusEntry> {
        self.read_all()
            .await
            .into_iter()
            .find(|e| e.product_id == product_id)
    }
}

/// Missing, unreadable or non-array content all read as an empty list
async fn read_raw(file: &File) -> Vec<Value> {
    if !file.exists().await {
        return Vec::new();
    }
    match file.read_json::<Value>().await {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            warn!(
                "Status file {} is not a JSON array, starting over",
                file.path().display()
            );
            Vec::new()
        }
        Err(e) => {
            warn!(
                "Status file {} is unreadable, starting over: {}",
                file.path().display(),
                e
            );
            Vec::new()
        }
    }
}

/// Add the seed's fields that the entry does not have yet
fn fill_missing(
    entry: &mut Map<String, Value>,
    seed: &SharedStatusEntry,
) -> Result<(), serde_json::Error> {
    if let Value::Object(fields) = serde_json::to_value(seed)? {
        for (key, value) in fields {
            entry.entry(key).or_insert(value);
        }
    }
    Ok(())
}

fn entry_product_id(value: &Value) -> Option<String> {
    match value.get("productId")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

async fn acquire_lock(path: &Path) -> Option<LockGuard> {
    let path = path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || FileLock::new(&path)?.exclusive()).await;
    match result {
        Ok(Ok(guard)) => Some(guard),
        Ok(Err(e)) => {
            warn!("Status file lock unavailable, writing unlocked: {}", e);
            None
        }
        Err(e) => {
            warn!("Status file lock task failed, writing unlocked: {}", e);
            None
        }
    }
}
