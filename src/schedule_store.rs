use crate::error::{BridgeError, Result};
use crate::types::{GroupId, ScheduledEntry};
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory scheduled commands, kept ordered by due time descending.
///
/// Entries with equal due times keep their insertion order. Every operation
/// takes the single internal lock once, so index resolution and removal can
/// never interleave with another writer.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    entries: Mutex<Vec<ScheduledEntry>>,
}

impl ScheduleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry` unless its group already owns `max_per_group` entries.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::QuotaExceeded` and leaves the store untouched
    /// when the group is at its maximum.
    pub async fn add(&self, entry: ScheduledEntry, max_per_group: usize) -> Result<()> {
        let mut entries = self.entries.lock().await;

        let owned = entries
            .iter()
            .filter(|existing| existing.group() == entry.group())
            .count();
        if owned + 1 > max_per_group {
            return Err(BridgeError::QuotaExceeded(format!(
                "group '{}' already owns {owned} of {max_per_group} scheduled entries",
                entry.group()
            )));
        }

        let position = entries.partition_point(|existing| existing.due() >= entry.due());
        debug!(
            "Scheduled entry for group {} due {} at position {}",
            entry.group(),
            entry.due(),
            position
        );
        entries.insert(position, entry);
        Ok(())
    }

    /// Snapshot of every entry, most-future-due first.
    pub async fn list(&self) -> Vec<ScheduledEntry> {
        self.entries.lock().await.clone()
    }

    /// # Errors
    ///
    /// Returns `BridgeError::NotFound` when `index` is out of range.
    pub async fn get(&self, index: usize) -> Result<ScheduledEntry> {
        self.entries
            .lock()
            .await
            .get(index)
            .cloned()
            .ok_or_else(|| no_schedule_at(index))
    }

    /// Removes and returns the entry at `index` of the descending ordering.
    ///
    /// # Errors
    ///
    /// Returns `BridgeError::NotFound` when `index` is out of range.
    pub async fn remove(&self, index: usize) -> Result<ScheduledEntry> {
        let mut entries = self.entries.lock().await;
        if index >= entries.len() {
            return Err(no_schedule_at(index));
        }
        let removed = entries.remove(index);
        debug!(
            "Removed scheduled entry for group {} due {}",
            removed.group(),
            removed.due()
        );
        Ok(removed)
    }

    pub async fn count_for(&self, group: &GroupId) -> usize {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|entry| entry.group() == group)
            .count()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

fn no_schedule_at(index: usize) -> BridgeError {
    BridgeError::NotFound(format!("no scheduled entry at index {index}"))
}
