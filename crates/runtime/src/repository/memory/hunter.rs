//! In-memory HunterRepository implementation for tests and local runs.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use autofarm_core::EntityId;

use crate::repository::{HunterRecord, HunterRepository, RepositoryError, Result};

/// Number of calls a repository has served.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub loads: usize,
    pub upserts: usize,
    pub batches: usize,
    pub batched_rows: usize,
}

impl RepositoryStats {
    pub fn total_calls(&self) -> usize {
        self.loads + self.upserts + self.batches
    }
}

/// Hash map backed repository that counts every call it serves.
#[derive(Debug, Default)]
pub struct InMemoryHunterRepository {
    rows: RwLock<HashMap<u32, HunterRecord>>,
    loads: AtomicUsize,
    upserts: AtomicUsize,
    batches: AtomicUsize,
    batched_rows: AtomicUsize,
}

impl InMemoryHunterRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = HunterRecord>) -> Self {
        let rows = records
            .into_iter()
            .map(|record| (record.player_id, record))
            .collect();
        Self {
            rows: RwLock::new(rows),
            ..Self::default()
        }
    }

    /// Reads a row without counting it as a load.
    pub fn get(&self, player: EntityId) -> Result<Option<HunterRecord>> {
        let rows = self.rows.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(rows.get(&player.get()).cloned())
    }

    pub fn stats(&self) -> RepositoryStats {
        RepositoryStats {
            loads: self.loads.load(Ordering::Relaxed),
            upserts: self.upserts.load(Ordering::Relaxed),
            batches: self.batches.load(Ordering::Relaxed),
            batched_rows: self.batched_rows.load(Ordering::Relaxed),
        }
    }
}

impl HunterRepository for InMemoryHunterRepository {
    fn load(&self, player: EntityId) -> Result<Option<HunterRecord>> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        self.get(player)
    }

    fn upsert(&self, record: &HunterRecord) -> Result<()> {
        self.upserts.fetch_add(1, Ordering::Relaxed);
        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        rows.insert(record.player_id, record.clone());
        Ok(())
    }

    fn update_batch(&self, records: &[HunterRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.batched_rows
            .fetch_add(records.len(), Ordering::Relaxed);

        let mut rows = self
            .rows
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        for record in records {
            if let Some(row) = rows.get_mut(&record.player_id) {
                row.remaining_minutes = record.remaining_minutes;
            }
        }
        Ok(())
    }
}
