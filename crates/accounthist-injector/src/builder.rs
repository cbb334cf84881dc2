use std::sync::Arc;

use accounthist_core::{Collection, FacetFactory, ShardCheckpoint, ShardNum};
use accounthist_storage::{RWCache, SharedStore};
use tokio_util::sync::CancellationToken;

use crate::flush::{BlockBatchMetrics, FlushPolicy};
use crate::pipeline::{Gate, StartPosition};
use crate::sequence::SequenceTracker;
use crate::source::{BlockSource, StaticStartBlockResolver, StartBlockResolver};
use crate::{Injector, InjectorError};

pub struct InjectorBuilder {
    store: Option<SharedStore>,
    source: Option<Box<dyn BlockSource>>,
    resolver: Box<dyn StartBlockResolver>,
    factory: FacetFactory,
    shard_num: ShardNum,
    /// Retention window of each facet (default: 1000)
    max_entries: u64,
    /// Block modulo forcing a flush (default: 1000)
    flush_blocks_interval: u64,
    start_block_num: u64,
    stop_block_num: u64,
    ignore_checkpoint_on_launch: bool,
    /// CancellationToken used to trigger shutdown of the Injector
    shutdown: Option<CancellationToken>,
}

impl Default for InjectorBuilder {
    fn default() -> Self {
        Self {
            store: None,
            source: None,
            resolver: Box::new(StaticStartBlockResolver::new()),
            factory: FacetFactory::new(Collection::Account),
            shard_num: 0,
            max_entries: 1000,
            flush_blocks_interval: 1000,
            start_block_num: 0,
            stop_block_num: 0,
            ignore_checkpoint_on_launch: false,
            shutdown: None,
        }
    }
}

impl InjectorBuilder {
    pub fn build(self) -> Result<Injector, InjectorError> {
        let store = self.store.ok_or(InjectorError::NoStore)?;
        let source = self.source.ok_or(InjectorError::NoBlockSource)?;

        if self.flush_blocks_interval == 0 {
            return Err(InjectorError::InvalidFlushInterval);
        }

        Ok(Injector {
            cache: Arc::new(RWCache::new(store)),
            checkpoint_key: self.factory.checkpoint_key(self.shard_num),
            factory: self.factory,
            shard_num: self.shard_num,
            stop_block_num: self.stop_block_num,
            source: Some(source),
            resolver: self.resolver,
            tracker: SequenceTracker::new(self.shard_num, self.max_entries),
            checkpoint: ShardCheckpoint::new(self.start_block_num, self.stop_block_num),
            start: StartPosition {
                gate: Gate::Exclusive(self.start_block_num),
                source_start_block_num: self.start_block_num,
                source_start_block_id: String::new(),
            },
            gate_open: false,
            start_block_num: self.start_block_num,
            ignore_checkpoint_on_launch: self.ignore_checkpoint_on_launch,
            flush_policy: FlushPolicy::new(self.flush_blocks_interval),
            batch: BlockBatchMetrics::default(),
            shutdown: self.shutdown.unwrap_or_default(),
        })
    }
}

impl InjectorBuilder {
    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);

        self
    }

    pub fn with_block_source<S: BlockSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));

        self
    }

    pub fn with_start_block_resolver<R: StartBlockResolver + 'static>(
        mut self,
        resolver: R,
    ) -> Self {
        self.resolver = Box::new(resolver);

        self
    }

    pub fn with_facet_factory(mut self, factory: FacetFactory) -> Self {
        self.factory = factory;

        self
    }

    pub fn with_shard_num(mut self, shard_num: ShardNum) -> Self {
        self.shard_num = shard_num;

        self
    }

    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;

        self
    }

    pub fn with_flush_blocks_interval(mut self, flush_blocks_interval: u64) -> Self {
        self.flush_blocks_interval = flush_blocks_interval;

        self
    }

    pub fn with_start_block_num(mut self, start_block_num: u64) -> Self {
        self.start_block_num = start_block_num;

        self
    }

    pub fn with_stop_block_num(mut self, stop_block_num: u64) -> Self {
        self.stop_block_num = stop_block_num;

        self
    }

    pub fn with_ignore_checkpoint_on_launch(mut self, ignore_checkpoint_on_launch: bool) -> Self {
        self.ignore_checkpoint_on_launch = ignore_checkpoint_on_launch;

        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = Some(shutdown);

        self
    }
}
