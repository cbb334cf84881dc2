use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::Ordinal;

/// Per facet cursor of the shard being ingested.
///
/// It is never stored on its own: the newest row of a facet in a shard carries everything
/// needed to rebuild it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceData {
    /// Last ordinal assigned in the shard, 0 when nothing was written yet
    pub current_ordinal: Ordinal,
    /// Global sequence of the newest recorded action
    pub last_global_seq: u64,
    /// Every ordinal up to and including this one was evicted from the shard
    pub last_deleted_ordinal: Ordinal,
    /// Retention window, 0 disables recording for the facet
    pub max_entries: u64,
}

impl SequenceData {
    /// State of a facet that was never seen in the current shard
    pub fn empty(max_entries: u64) -> Self {
        Self {
            max_entries,
            ..Default::default()
        }
    }

    /// Newest ordinal that falls out of the retention window ending at `current_ordinal`, if
    /// the window is full.
    pub fn least_recent_ordinal(&self) -> Option<Ordinal> {
        (self.current_ordinal > self.max_entries)
            .then(|| self.current_ordinal - self.max_entries)
    }

    /// Ordinals that fall out of the retention window and have not been deleted yet
    pub fn stale_ordinals(&self) -> Option<RangeInclusive<Ordinal>> {
        self.least_recent_ordinal()
            .filter(|least| self.last_deleted_ordinal < *least)
            .map(|least| (self.last_deleted_ordinal + 1)..=least)
    }
}
