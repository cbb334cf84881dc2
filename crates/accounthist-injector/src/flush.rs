use std::time::{Duration, Instant, SystemTime};

use accounthist_core::Block;
use tracing::info;

/// A block produced less than this long ago is considered near real time.
pub const NEAR_REAL_TIME_WINDOW: Duration = Duration::from_secs(15);

/// Block modulo at which a batch summary is logged.
pub const BATCH_LOG_INTERVAL: u64 = 1000;

pub fn is_near_real_time(block: &Block, now: SystemTime) -> bool {
    block.drift(now) < NEAR_REAL_TIME_WINDOW
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushReason {
    /// Last block of a streak close to the head of the chain
    NearRealTime,
    /// Block number crossed the flush interval
    Interval,
}

/// Decides when buffered writes are made durable.
#[derive(Debug)]
pub struct FlushPolicy {
    interval: u64,
    last_interval_flush: Option<(Instant, u64)>,
}

impl FlushPolicy {
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            last_interval_flush: None,
        }
    }

    pub fn should_flush(
        &self,
        block: &Block,
        is_last_in_streak: bool,
        now: SystemTime,
    ) -> Option<FlushReason> {
        if is_last_in_streak && is_near_real_time(block, now) {
            return Some(FlushReason::NearRealTime);
        }

        (block.number % self.interval == 0).then_some(FlushReason::Interval)
    }

    /// Record an interval flush, returning the blocks per second since the previous one.
    pub fn record_interval_flush(&mut self, block_num: u64) -> Option<f64> {
        let now = Instant::now();
        let throughput = self.last_interval_flush.map(|(at, previous_block_num)| {
            let elapsed = now.duration_since(at).as_secs_f64();
            let blocks = block_num.saturating_sub(previous_block_num) as f64;
            if elapsed > 0.0 {
                blocks / elapsed
            } else {
                0.0
            }
        });

        self.last_interval_flush = Some((now, block_num));
        throughput
    }
}

/// Counters of the blocks processed since the last batch summary.
#[derive(Debug)]
pub struct BlockBatchMetrics {
    batch_start: Instant,
    pub block_count: u64,
    pub actions_written: u64,
    pub actions_deleted: u64,
    pub actions_skipped: u64,
}

impl Default for BlockBatchMetrics {
    fn default() -> Self {
        Self {
            batch_start: Instant::now(),
            block_count: 0,
            actions_written: 0,
            actions_deleted: 0,
            actions_skipped: 0,
        }
    }
}

impl BlockBatchMetrics {
    pub fn log(&self, block: &Block, cache_size: usize, read_seq_calls: u64) {
        info!(
            block_id = %block.id,
            block_num = block.number,
            block_count = self.block_count,
            actions_written = self.actions_written,
            actions_deleted = self.actions_deleted,
            actions_skipped = self.actions_skipped,
            read_seq_calls,
            cache_size,
            elapsed = ?self.batch_start.elapsed(),
            "Processed block batch"
        );
    }
}
