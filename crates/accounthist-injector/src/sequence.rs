use std::collections::HashMap;

use accounthist_core::{Facet, SequenceData, ShardNum};
use accounthist_storage::sequence::shard_seq_data_per_facet;
use accounthist_storage::{KVStore, StorageError};
use tracing::debug;

/// In-memory cursors of the facets touched by one ingestion run.
///
/// A cursor is rebuilt from the newest row of the facet in the ingested shard the first time the
/// facet is met, then only lives in memory. Rows written during the run stay buffered until a
/// flush, so the cache is the only source of truth once a facet is loaded.
#[derive(Debug)]
pub struct SequenceTracker {
    cache: HashMap<Facet, SequenceData>,
    shard_num: ShardNum,
    max_entries: u64,
    started_from_checkpoint: bool,
    read_calls: u64,
}

impl SequenceTracker {
    pub fn new(shard_num: ShardNum, max_entries: u64) -> Self {
        Self {
            cache: HashMap::new(),
            shard_num,
            max_entries,
            started_from_checkpoint: false,
            read_calls: 0,
        }
    }

    /// Whether the run resumed a shard, a fresh shard has nothing to read back
    pub fn set_started_from_checkpoint(&mut self, started_from_checkpoint: bool) {
        self.started_from_checkpoint = started_from_checkpoint;
    }

    pub async fn get_or_init(
        &mut self,
        store: &dyn KVStore,
        facet: &Facet,
    ) -> Result<SequenceData, StorageError> {
        if let Some(sequence) = self.cache.get(facet) {
            return Ok(*sequence);
        }

        if !self.started_from_checkpoint {
            return Ok(SequenceData::empty(self.max_entries));
        }

        self.read_calls += 1;
        match shard_seq_data_per_facet(store, facet, self.shard_num, self.max_entries).await {
            Ok(sequence) => {
                debug!(
                    facet = %facet,
                    current_ordinal = sequence.current_ordinal,
                    last_global_seq = sequence.last_global_seq,
                    "Recovered sequence data"
                );
                Ok(sequence)
            }
            Err(StorageError::NotFound) => Ok(SequenceData::empty(self.max_entries)),
            Err(error) => Err(error),
        }
    }

    pub fn update(&mut self, facet: Facet, sequence: SequenceData) {
        self.cache.insert(facet, sequence);
    }

    pub fn get(&self, facet: &Facet) -> Option<&SequenceData> {
        self.cache.get(facet)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Number of cold start reads issued against the store
    pub fn read_calls(&self) -> u64 {
        self.read_calls
    }
}
