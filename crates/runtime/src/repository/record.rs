use serde::{Deserialize, Serialize};

/// Persisted part of a hunter. Settings and loadout live only in memory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunterRecord {
    pub player_id: u32,
    pub name: String,
    pub remaining_minutes: u32,
}
