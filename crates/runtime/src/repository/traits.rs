//! Storage contract for hunter records.

use autofarm_core::EntityId;

use super::{HunterRecord, Result};

/// Keyed storage of hunter time budgets.
///
/// Implementations are shared between request threads (single-row writes on
/// purchase) and the scheduler (batch writes at the end of a save interval).
pub trait HunterRepository: Send + Sync {
    /// Stored record for `player`, `None` when the player never bought time.
    fn load(&self, player: EntityId) -> Result<Option<HunterRecord>>;

    /// Inserts or overwrites the record keyed by `player_id`. Idempotent.
    fn upsert(&self, record: &HunterRecord) -> Result<()>;

    /// Writes remaining minutes for records that already exist; names and
    /// unknown players are left untouched. An empty slice is a no-op.
    fn update_batch(&self, records: &[HunterRecord]) -> Result<()>;
}
