use std::collections::HashMap;
use std::time::SystemTime;

use accounthist_core::row::{encode_row_value, ActionRow};
use accounthist_core::{Block, Facet, Ordinal, SequenceData};
use accounthist_metrics::{
    INJECTOR_ACTIONS_DELETED_TOTAL, INJECTOR_ACTIONS_WRITTEN_TOTAL,
    INJECTOR_BLOCKS_PROCESSED_TOTAL, INJECTOR_FLUSH_TOTAL, INJECTOR_HEAD_BLOCK_NUMBER,
    INJECTOR_HEAD_BLOCK_TIME_DRIFT,
};
use accounthist_storage::checkpoint::put_shard_checkpoint;
use accounthist_storage::{with_timeout, KVStore};
use tracing::{debug, info, trace};

use crate::errors::InjectorError;
use crate::flush::{BlockBatchMetrics, FlushReason, BATCH_LOG_INTERVAL};
use crate::source::{ForkStep, ForkableBlock};
use crate::Injector;

/// Encoded [`ActionRow`] of every recordable action of a block, by global sequence.
pub type PreprocessedActions = HashMap<u64, Vec<u8>>;

/// Encode once every matched action of the non reverted transactions of a block.
pub fn preprocess_block(block: &Block) -> Result<PreprocessedActions, InjectorError> {
    let mut out = HashMap::new();

    for trx in block
        .transaction_traces
        .iter()
        .filter(|trx| !trx.reverted)
    {
        for action in &trx.action_traces {
            let Some(global_sequence) = action.global_sequence() else {
                continue;
            };

            if !block.is_action_matched(action) {
                continue;
            }

            let row = ActionRow::new(block, trx, action);
            out.insert(global_sequence, row.encode()?);
        }
    }

    Ok(out)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockOutcome {
    Continue,
    /// The stop block was reached and everything was flushed
    Stop,
}

impl Injector {
    pub async fn process_block(
        &mut self,
        forkable: &ForkableBlock,
    ) -> Result<BlockOutcome, InjectorError> {
        let block = &forkable.block;

        INJECTOR_HEAD_BLOCK_NUMBER.set(block.number as i64);
        INJECTOR_HEAD_BLOCK_TIME_DRIFT.set(block.drift(SystemTime::now()).as_secs_f64());

        if forkable.step != ForkStep::Irreversible {
            trace!(block = %block, step = ?forkable.step, "Received non irreversible block");
            return Ok(BlockOutcome::Continue);
        }

        if !self.gate_open {
            if !self.start.gate.passes(block.number) {
                trace!(block = %block, gate = ?self.start.gate, "Block before start gate");
                return Ok(BlockOutcome::Continue);
            }

            info!(block = %block, gate = ?self.start.gate, "Start gate passed");
            self.gate_open = true;
        }

        if self.stop_block_num != 0 && block.number >= self.stop_block_num {
            info!(
                stop_block_num = self.stop_block_num,
                block_num = block.number,
                "Stop block num reached, flushing all writes"
            );
            self.force_flush(block).await?;

            return Ok(BlockOutcome::Stop);
        }

        let encoded_actions = preprocess_block(block)?;

        for trx in block
            .transaction_traces
            .iter()
            .filter(|trx| !trx.reverted)
        {
            for action in &trx.action_traces {
                let Some(global_sequence) = action.global_sequence() else {
                    continue;
                };

                if !block.is_action_matched(action) || !self.factory.action_filter(action) {
                    continue;
                }

                let Some(encoded) = encoded_actions.get(&global_sequence) else {
                    continue;
                };

                for subject in action.subjects() {
                    let facet = self.factory.new_facet(block, action, subject);
                    self.record_action(block, &facet, global_sequence, encoded)
                        .await?;
                }
            }
        }

        self.checkpoint.record(block.number, &block.id);
        put_shard_checkpoint(&*self.cache, &self.checkpoint_key, &self.checkpoint).await?;

        self.flush(block, forkable.is_last_in_streak()).await?;

        INJECTOR_BLOCKS_PROCESSED_TOTAL.inc();
        self.batch.block_count += 1;
        if block.number % BATCH_LOG_INTERVAL == 0 {
            self.batch
                .log(block, self.tracker.len(), self.tracker.read_calls());
            self.batch = BlockBatchMetrics::default();
        }

        Ok(BlockOutcome::Continue)
    }

    async fn record_action(
        &mut self,
        block: &Block,
        facet: &Facet,
        global_sequence: u64,
        encoded: &[u8],
    ) -> Result<(), InjectorError> {
        let mut sequence = self
            .tracker
            .get_or_init(&*self.cache, facet)
            .await?;

        if sequence.max_entries == 0 {
            return Ok(());
        }

        if global_sequence <= sequence.last_global_seq {
            debug!(
                block = %block,
                facet = %facet,
                global_sequence,
                last_global_seq = sequence.last_global_seq,
                "Action already recorded for this facet"
            );
            self.batch.actions_skipped += 1;
            return Ok(());
        }

        // The retention window ends at the ordinal about to be written
        sequence.current_ordinal += 1;
        sequence.last_deleted_ordinal = self.delete_stale_rows(facet, &sequence).await?;

        self.write_action(facet, &sequence, encoded).await?;
        sequence.last_global_seq = global_sequence;

        self.tracker.update(*facet, sequence);

        Ok(())
    }

    /// Evict the rows that fell out of the retention window, returning the new last deleted
    /// ordinal.
    ///
    /// With a window of 5 and ordinal 12 being written, the window is `[8, 12]`: everything after
    /// the previous last deleted ordinal up to 7 goes.
    async fn delete_stale_rows(
        &mut self,
        facet: &Facet,
        sequence: &SequenceData,
    ) -> Result<Ordinal, InjectorError> {
        let Some(stale) = sequence.stale_ordinals() else {
            return Ok(sequence.last_deleted_ordinal);
        };

        let least_recent_ordinal = *stale.end();
        debug!(
            facet = %facet,
            last_deleted_ordinal = sequence.last_deleted_ordinal,
            least_recent_ordinal,
            "Deleting actions between last deleted and least recent ordinal"
        );

        for ordinal in stale {
            let key = facet.row(self.shard_num, ordinal);
            trace!(facet = %facet, ordinal, key = %key, "Deleting action");

            with_timeout(self.cache.batch_delete(&[key.into_vec()])).await?;

            INJECTOR_ACTIONS_DELETED_TOTAL.inc();
            self.batch.actions_deleted += 1;
        }

        Ok(least_recent_ordinal)
    }

    async fn write_action(
        &mut self,
        facet: &Facet,
        sequence: &SequenceData,
        encoded: &[u8],
    ) -> Result<(), InjectorError> {
        let key = facet.row(self.shard_num, sequence.current_ordinal);
        debug!(facet = %facet, ordinal = sequence.current_ordinal, key = %key, "Writing action");

        let value = encode_row_value(encoded, sequence.last_deleted_ordinal);
        with_timeout(self.cache.put(key.as_bytes(), &value)).await?;

        INJECTOR_ACTIONS_WRITTEN_TOTAL.inc();
        self.batch.actions_written += 1;

        Ok(())
    }

    async fn flush(&mut self, block: &Block, is_last_in_streak: bool) -> Result<(), InjectorError> {
        match self
            .flush_policy
            .should_flush(block, is_last_in_streak, SystemTime::now())
        {
            Some(FlushReason::Interval) => {
                if let Some(blocks_per_sec) = self.flush_policy.record_interval_flush(block.number)
                {
                    info!(blocks_per_sec, "Block throughput");
                }
                self.force_flush(block).await
            }
            Some(FlushReason::NearRealTime) => self.force_flush(block).await,
            None => Ok(()),
        }
    }

    pub(crate) async fn force_flush(&mut self, block: &Block) -> Result<(), InjectorError> {
        debug!(block = %block, "Flushing block");
        with_timeout(self.cache.flush_puts()).await?;
        INJECTOR_FLUSH_TOTAL.inc();

        Ok(())
    }
}
