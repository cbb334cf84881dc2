//! Block delivery seam of the injector.
//!
//! A [`BlockSource`] yields an ordered, fork aware sequence of [`ForkableBlock`]. Only
//! [`ForkStep::Irreversible`] blocks are persisted, [`ForkStep::New`] ones only move the head
//! metrics.

use std::path::PathBuf;

use accounthist_core::checkpoint::FIRST_STREAMABLE_BLOCK;
use accounthist_core::Block;
use async_stream::stream;
use async_trait::async_trait;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::errors::{BlockSourceError, InjectorError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForkStep {
    New,
    Irreversible,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForkableBlock {
    pub block: Block,
    pub step: ForkStep,
    /// Position of the block in the streak of blocks delivered for the same step
    pub step_index: usize,
    pub step_count: usize,
}

impl ForkableBlock {
    pub fn new(block: Block, step: ForkStep) -> Self {
        Self {
            block,
            step,
            step_index: 0,
            step_count: 1,
        }
    }

    /// A block made irreversible on its own
    pub fn irreversible(block: Block) -> Self {
        Self::new(block, ForkStep::Irreversible)
    }

    pub fn with_streak(mut self, step_index: usize, step_count: usize) -> Self {
        self.step_index = step_index;
        self.step_count = step_count;
        self
    }

    pub fn is_last_in_streak(&self) -> bool {
        self.step_index + 1 == self.step_count
    }
}

pub type BlockStream = BoxStream<'static, Result<ForkableBlock, BlockSourceError>>;

pub trait BlockSource: Send {
    /// Stream blocks from `start_block_num` onward.
    ///
    /// The stream ends when the source is exhausted or once `shutdown` is cancelled.
    fn stream(self: Box<Self>, start_block_num: u64, shutdown: CancellationToken) -> BlockStream;
}

/// Source of in-memory blocks.
#[derive(Clone, Debug, Default)]
pub struct VecBlockSource {
    blocks: Vec<ForkableBlock>,
}

impl VecBlockSource {
    pub fn new(blocks: Vec<ForkableBlock>) -> Self {
        Self { blocks }
    }

    /// Every block delivered as irreversible, the whole vector forming a single streak
    pub fn irreversible(blocks: Vec<Block>) -> Self {
        let step_count = blocks.len();
        let blocks = blocks
            .into_iter()
            .enumerate()
            .map(|(index, block)| ForkableBlock::irreversible(block).with_streak(index, step_count))
            .collect();

        Self { blocks }
    }
}

impl BlockSource for VecBlockSource {
    fn stream(self: Box<Self>, start_block_num: u64, shutdown: CancellationToken) -> BlockStream {
        let blocks = self
            .blocks
            .into_iter()
            .filter(move |forkable| forkable.block.number >= start_block_num)
            .map(Ok);

        stream::iter(blocks)
            .take_until(async move { shutdown.cancelled().await })
            .boxed()
    }
}

/// Source reading one JSON encoded [`Block`] per line, every block being irreversible.
#[derive(Clone, Debug)]
pub struct JsonLinesBlockSource {
    path: PathBuf,
}

impl JsonLinesBlockSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl BlockSource for JsonLinesBlockSource {
    fn stream(self: Box<Self>, start_block_num: u64, shutdown: CancellationToken) -> BlockStream {
        let path = self.path;

        let blocks = stream! {
            info!(path = %path.display(), start_block_num, "Opening JSON lines block source");

            let file = match File::open(&path).await {
                Ok(file) => file,
                Err(error) => {
                    yield Err(BlockSourceError::Io(error));
                    return;
                }
            };

            let mut lines = BufReader::new(file).lines();
            let mut line_number = 0;

            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(error) => {
                        yield Err(BlockSourceError::Io(error));
                        return;
                    }
                };
                line_number += 1;

                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<Block>(&line) {
                    Ok(block) if block.number < start_block_num => {
                        debug!(block_num = block.number, "Skipping block before start");
                    }
                    Ok(block) => yield Ok(ForkableBlock::irreversible(block)),
                    Err(source) => {
                        yield Err(BlockSourceError::Decode { line: line_number, source });
                        return;
                    }
                }
            }

            info!(path = %path.display(), lines = line_number, "Block source exhausted");
        };

        blocks
            .take_until(async move { shutdown.cancelled().await })
            .boxed()
    }
}

/// Resolved physical start of the block source for a logical start block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedStart {
    pub source_start_block_num: u64,
    /// Id of the irreversible block right before the source start, empty if unknown
    pub previous_irreversible_id: String,
}

/// Chain position tracker resolving where the block source must start to reach a block.
#[async_trait]
pub trait StartBlockResolver: Send + Sync {
    async fn resolve_start_block(
        &self,
        target_block_num: u64,
    ) -> Result<ResolvedStart, InjectorError>;
}

/// Resolver replaying a fixed number of blocks before the target, 0 by default.
#[derive(Clone, Debug, Default)]
pub struct StaticStartBlockResolver {
    replay_distance: u64,
}

impl StaticStartBlockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replay_distance(mut self, replay_distance: u64) -> Self {
        self.replay_distance = replay_distance;
        self
    }
}

#[async_trait]
impl StartBlockResolver for StaticStartBlockResolver {
    async fn resolve_start_block(
        &self,
        target_block_num: u64,
    ) -> Result<ResolvedStart, InjectorError> {
        let source_start_block_num = target_block_num
            .saturating_sub(self.replay_distance)
            .max(FIRST_STREAMABLE_BLOCK);

        Ok(ResolvedStart {
            source_start_block_num,
            previous_irreversible_id: String::new(),
        })
    }
}
