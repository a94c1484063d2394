//! Bounded, most-recent-first list of generated cover letters.

pub mod handlers;

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::storage::{read_json, write_json, KvStore, StorageError, HISTORY_KEY};

pub const DEFAULT_MAX_HISTORY: usize = 5;

/// Persisted shape. The HTTP API exposes these through
/// [`handlers::HistoryEntryResponse`] in snake_case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub cover_letter: String,
    pub job_title: String,
    pub company_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller; id and timestamp are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub cover_letter: String,
    pub job_title: String,
    pub company_name: String,
}

#[derive(Clone)]
pub struct HistoryList {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    max_entries: usize,
    /// Serializes read-modify-write cycles on the stored list.
    write_lock: Arc<Mutex<()>>,
}

impl HistoryList {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>, max_entries: usize) -> Self {
        Self {
            store,
            clock,
            max_entries,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Prepends `entry` and evicts from the tail past the cap.
    pub fn record(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.list();
        let entry = HistoryEntry {
            // v7 ids are time-ordered and unique even when timestamps collide
            id: Uuid::now_v7().to_string(),
            cover_letter: entry.cover_letter,
            job_title: entry.job_title,
            company_name: entry.company_name,
            created_at: self.clock.now(),
        };

        entries.insert(0, entry.clone());
        entries.truncate(self.max_entries);
        write_json(self.store.as_ref(), HISTORY_KEY, &entries)?;

        debug!("History entry {} recorded ({} kept)", entry.id, entries.len());
        Ok(entry)
    }

    /// Full list, newest first. Empty if nothing usable is stored.
    pub fn list(&self) -> Vec<HistoryEntry> {
        read_json(self.store.as_ref(), HISTORY_KEY).unwrap_or_default()
    }

    pub fn find_by_id(&self, id: &str) -> Option<HistoryEntry> {
        self.list().into_iter().find(|e| e.id == id)
    }

    /// Returns whether an entry was removed.
    pub fn delete_by_id(&self, id: &str) -> Result<bool, StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.list();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() == before {
            return Ok(false);
        }
        write_json(self.store.as_ref(), HISTORY_KEY, &entries)?;
        Ok(true)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::Poisoned)?;
        self.store.remove(HISTORY_KEY)?;
        info!("History cleared");
        Ok(())
    }
}
