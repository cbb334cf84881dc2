//! Ingestion of an irreversible block stream into one shard of the account history.
//!
//! The [`Injector`] owns everything one ingestion run needs: the write buffering cache in front
//! of the store, the in-memory facet cursors and the shard checkpoint. Run it by awaiting it,
//! it returns once the source is exhausted, the stop block is reached or the shutdown token is
//! cancelled.

use std::future::IntoFuture;
use std::sync::Arc;

use accounthist_core::{Block, FacetFactory, ShardCheckpoint, ShardNum};
use accounthist_storage::RWCache;
use futures::future::BoxFuture;
use futures::{FutureExt, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

mod builder;
pub mod errors;
pub mod flush;
pub mod pipeline;
pub mod process_block;
pub mod sequence;
pub mod source;

#[cfg(test)]
mod tests;

pub use builder::InjectorBuilder;
pub use errors::{BlockSourceError, InjectorError};
pub use pipeline::{Gate, StartPosition};
pub use process_block::BlockOutcome;
pub use sequence::SequenceTracker;
pub use source::{
    BlockSource, ForkStep, ForkableBlock, JsonLinesBlockSource, ResolvedStart,
    StaticStartBlockResolver, StartBlockResolver, VecBlockSource,
};

use flush::{BlockBatchMetrics, FlushPolicy};
use pipeline::{resolve_checkpoint, resolve_start_block};

pub struct Injector {
    pub(crate) cache: Arc<RWCache>,
    pub(crate) factory: FacetFactory,
    pub(crate) shard_num: ShardNum,
    pub(crate) stop_block_num: u64,

    pub(crate) source: Option<Box<dyn BlockSource>>,
    pub(crate) resolver: Box<dyn StartBlockResolver>,

    pub(crate) tracker: SequenceTracker,
    pub(crate) checkpoint_key: Vec<u8>,
    pub(crate) checkpoint: ShardCheckpoint,
    pub(crate) start: StartPosition,
    pub(crate) gate_open: bool,

    start_block_num: u64,
    ignore_checkpoint_on_launch: bool,

    pub(crate) flush_policy: FlushPolicy,
    pub(crate) batch: BlockBatchMetrics,

    shutdown: CancellationToken,
}

impl Injector {
    pub fn builder() -> InjectorBuilder {
        InjectorBuilder::default()
    }

    pub fn shard_num(&self) -> ShardNum {
        self.shard_num
    }

    pub fn checkpoint(&self) -> &ShardCheckpoint {
        &self.checkpoint
    }

    pub fn start_position(&self) -> &StartPosition {
        &self.start
    }

    /// Token cancelled when the injector stops, cancel it to stop the injector
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Resolve the shard checkpoint and the position the block source starts from.
    pub async fn setup(&mut self) -> Result<(), InjectorError> {
        let resolved = resolve_checkpoint(
            &*self.cache,
            &self.checkpoint_key,
            self.shard_num,
            self.start_block_num,
            self.stop_block_num,
            self.ignore_checkpoint_on_launch,
        )
        .await?;

        self.tracker
            .set_started_from_checkpoint(resolved.started_from_checkpoint);
        self.checkpoint = resolved.checkpoint;

        if self.stop_block_num == 0 && self.checkpoint.target_stop_block != 0 {
            info!(
                target_stop_block = self.checkpoint.target_stop_block,
                "No stop block configured, using the checkpoint target stop block"
            );
            self.stop_block_num = self.checkpoint.target_stop_block;
        }

        self.start = resolve_start_block(&self.checkpoint, self.resolver.as_ref()).await?;

        info!(
            shard_num = self.shard_num,
            gate = ?self.start.gate,
            source_start_block_num = self.start.source_start_block_num,
            source_start_block_id = %self.start.source_start_block_id,
            "Setting up pipeline"
        );

        Ok(())
    }

    async fn run(mut self) -> Result<(), InjectorError> {
        self.setup().await?;

        let source = self.source.take().ok_or(InjectorError::NoBlockSource)?;
        let mut blocks = source.stream(
            self.start.source_start_block_num,
            self.shutdown.child_token(),
        );

        let mut last_block: Option<Block> = None;
        let result = loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("Injector shutdown requested, shutting down block source");
                    break Ok(());
                }
                next = blocks.next() => {
                    match next {
                        None => {
                            info!("Block source terminated, shutting down injector");
                            break Ok(());
                        }
                        Some(Err(error)) => break Err(InjectorError::from(error)),
                        Some(Ok(forkable)) => match self.process_block(&forkable).await {
                            Ok(BlockOutcome::Continue) => last_block = Some(forkable.block),
                            Ok(BlockOutcome::Stop) => {
                                self.shutdown.cancel();
                                return Ok(());
                            }
                            Err(error) => break Err(error),
                        },
                    }
                }
            }
        };

        self.shutdown.cancel();

        match result {
            Ok(()) => {
                let block = last_block.unwrap_or_default();
                self.force_flush(&block).await?;
                info!(
                    last_written_block_num = self.checkpoint.last_written_block_num,
                    "Injector stopped"
                );
                Ok(())
            }
            Err(error) => {
                error!(error = %error, "Injector stopped on error");
                warn!(
                    last_written_block_num = self.checkpoint.last_written_block_num,
                    "Buffered writes since the last flush are dropped"
                );
                Err(error)
            }
        }
    }
}

impl IntoFuture for Injector {
    type Output = Result<(), InjectorError>;

    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        self.run().boxed()
    }
}
