//! Checkpoint and start block resolution, run once before the first block is consumed.

use accounthist_core::{ShardCheckpoint, ShardNum};
use accounthist_storage::checkpoint::get_shard_checkpoint;
use accounthist_storage::KVStore;
use tracing::info;

use crate::errors::InjectorError;
use crate::source::StartBlockResolver;

/// Logical gate applied on the block numbers delivered by the source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gate {
    Inclusive(u64),
    Exclusive(u64),
}

impl Gate {
    pub fn passes(&self, block_num: u64) -> bool {
        match self {
            Gate::Inclusive(gate) => block_num >= *gate,
            Gate::Exclusive(gate) => block_num > *gate,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartPosition {
    pub gate: Gate,
    /// First block requested from the source, possibly before the gate
    pub source_start_block_num: u64,
    pub source_start_block_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedCheckpoint {
    pub checkpoint: ShardCheckpoint,
    pub started_from_checkpoint: bool,
}

pub async fn resolve_checkpoint(
    store: &dyn KVStore,
    checkpoint_key: &[u8],
    shard_num: ShardNum,
    start_block_num: u64,
    stop_block_num: u64,
    ignore_checkpoint_on_launch: bool,
) -> Result<ResolvedCheckpoint, InjectorError> {
    if ignore_checkpoint_on_launch {
        let checkpoint = ShardCheckpoint::new(start_block_num, stop_block_num);
        info!(
            shard_num,
            checkpoint = ?checkpoint,
            "Ignoring checkpoint on launch, starting without a checkpoint"
        );

        return Ok(ResolvedCheckpoint {
            checkpoint,
            started_from_checkpoint: false,
        });
    }

    if let Some(checkpoint) = get_shard_checkpoint(store, checkpoint_key).await? {
        info!(shard_num, checkpoint = ?checkpoint, "Found checkpoint");

        return Ok(ResolvedCheckpoint {
            checkpoint,
            started_from_checkpoint: true,
        });
    }

    let checkpoint = ShardCheckpoint::new(start_block_num, stop_block_num);
    info!(shard_num, checkpoint = ?checkpoint, "Starting without checkpoint");

    Ok(ResolvedCheckpoint {
        checkpoint,
        started_from_checkpoint: false,
    })
}

pub async fn resolve_start_block(
    checkpoint: &ShardCheckpoint,
    resolver: &dyn StartBlockResolver,
) -> Result<StartPosition, InjectorError> {
    if checkpoint.has_written_block() {
        info!(
            checkpoint = ?checkpoint,
            "Resolving start block from checkpoint last written block"
        );

        return Ok(StartPosition {
            gate: Gate::Exclusive(checkpoint.last_written_block_num),
            source_start_block_num: checkpoint.last_written_block_num,
            source_start_block_id: checkpoint.last_written_block_id.clone(),
        });
    }

    info!(
        checkpoint = ?checkpoint,
        "Checkpoint does not have a last written block, resolving start block with tracker"
    );

    let resolved = resolver
        .resolve_start_block(checkpoint.initial_start_block)
        .await?;

    Ok(StartPosition {
        gate: Gate::Exclusive(checkpoint.initial_start_block),
        source_start_block_num: resolved.source_start_block_num,
        source_start_block_id: resolved.previous_irreversible_id,
    })
}
