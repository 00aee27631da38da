//! File-based HunterRepository implementation.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use autofarm_core::EntityId;
use serde::{Deserialize, Serialize};

use crate::repository::{HunterRecord, HunterRepository, RepositoryError, Result};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct StoredHunter {
    name: String,
    remaining_minutes: u32,
}

type Document = BTreeMap<u32, StoredHunter>;

/// Single JSON document keyed by player id.
///
/// The whole document is cached in memory and rewritten on every write
/// (temp file + rename), so a crash never leaves a half-written file behind.
/// Batch updates are applied in chunks of `batch_size` rows, one rewrite per
/// chunk.
pub struct FileHunterRepository {
    path: PathBuf,
    batch_size: usize,
    rows: Mutex<Document>,
}

impl FileHunterRepository {
    /// Opens the document at `path`, creating parent directories as needed.
    /// A missing file is an empty repository.
    pub fn open(path: impl AsRef<Path>, batch_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let rows = if path.exists() {
            let json = fs::read_to_string(&path)?;
            if json.trim().is_empty() {
                Document::new()
            } else {
                serde_json::from_str(&json).map_err(|e| {
                    RepositoryError::CorruptedData(format!("{}: {e}", path.display()))
                })?
            }
        } else {
            Document::new()
        };

        tracing::debug!(rows = rows.len(), "Opened hunter store {}", path.display());

        Ok(Self {
            path,
            batch_size: batch_size.max(1),
            rows: Mutex::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn rows(&self) -> Result<MutexGuard<'_, Document>> {
        self.rows.lock().map_err(|_| RepositoryError::LockPoisoned)
    }

    fn persist(&self, rows: &Document) -> Result<()> {
        let temp_path = self.path.with_extension("json.tmp");
        let json =
            serde_json::to_string_pretty(rows).map_err(|e| RepositoryError::Json(e.to_string()))?;
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl HunterRepository for FileHunterRepository {
    fn load(&self, player: EntityId) -> Result<Option<HunterRecord>> {
        let rows = self.rows()?;
        Ok(rows.get(&player.get()).map(|stored| HunterRecord {
            player_id: player.get(),
            name: stored.name.clone(),
            remaining_minutes: stored.remaining_minutes,
        }))
    }

    fn upsert(&self, record: &HunterRecord) -> Result<()> {
        let mut rows = self.rows()?;
        let mut next = rows.clone();
        next.insert(
            record.player_id,
            StoredHunter {
                name: record.name.clone(),
                remaining_minutes: record.remaining_minutes,
            },
        );
        self.persist(&next)?;
        *rows = next;

        tracing::debug!(player = record.player_id, "Upserted hunter record");
        Ok(())
    }

    fn update_batch(&self, records: &[HunterRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut rows = self.rows()?;
        for chunk in records.chunks(self.batch_size) {
            let mut next = rows.clone();
            let mut touched = 0usize;
            for record in chunk {
                if let Some(stored) = next.get_mut(&record.player_id) {
                    stored.remaining_minutes = record.remaining_minutes;
                    touched += 1;
                }
            }
            if touched > 0 {
                self.persist(&next)?;
                *rows = next;
            }
            tracing::trace!(rows = chunk.len(), touched, "Applied hunter batch chunk");
        }
        Ok(())
    }
}
