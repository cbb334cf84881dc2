use serde::{Deserialize, Serialize};

use crate::errors::CheckpointError;

/// First block number a block source is able to stream, block 1 is the genesis.
pub const FIRST_STREAMABLE_BLOCK: u64 = 2;

/// Ingestion progress of one shard, overwritten after every irreversible block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardCheckpoint {
    pub initial_start_block: u64,
    /// 0 when the shard has no stop block, used on resume when no stop block is configured
    pub target_stop_block: u64,
    pub last_written_block_num: u64,
    /// Empty until the first block is written
    pub last_written_block_id: String,
}

impl ShardCheckpoint {
    pub fn new(start_block: u64, stop_block: u64) -> Self {
        Self {
            initial_start_block: start_block.max(FIRST_STREAMABLE_BLOCK),
            target_stop_block: stop_block,
            ..Default::default()
        }
    }

    pub fn has_written_block(&self) -> bool {
        !self.last_written_block_id.is_empty()
    }

    pub fn record(&mut self, block_num: u64, block_id: &str) {
        self.last_written_block_num = block_num;
        self.last_written_block_id = block_id.to_string();
    }

    pub fn encode(&self) -> Result<Vec<u8>, CheckpointError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CheckpointError> {
        Ok(bincode::deserialize(bytes)?)
    }
}
