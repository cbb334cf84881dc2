use accounthist_core::keyer::prefix_next;
use accounthist_core::row::decode_row_value;
use accounthist_core::{ActionTrace, Block, Collection, Facet, FacetFactory, ShardNum};
use accounthist_storage::{KVStore, SharedStore};
use accounthist_test_sdk::name;

use crate::source::{ForkableBlock, VecBlockSource};
use crate::Injector;

/// Injector flushing after every block, fed directly through `process_block`.
pub(crate) fn setup_injector(
    store: SharedStore,
    collection: Collection,
    shard_num: ShardNum,
    max_entries: u64,
) -> Injector {
    Injector::builder()
        .with_store(store)
        .with_block_source(VecBlockSource::default())
        .with_facet_factory(FacetFactory::new(collection))
        .with_shard_num(shard_num)
        .with_max_entries(max_entries)
        .with_flush_blocks_interval(1)
        .build()
        .unwrap()
}

pub(crate) async fn stream_blocks(injector: &mut Injector, blocks: Vec<Block>) {
    for block in blocks {
        injector
            .process_block(&ForkableBlock::irreversible(block))
            .await
            .unwrap();
    }
}

pub(crate) async fn run_shard(
    store: SharedStore,
    shard_num: ShardNum,
    max_entries: u64,
    blocks: Vec<Block>,
) {
    let mut injector = setup_injector(store, Collection::Account, shard_num, max_entries);
    stream_blocks(&mut injector, blocks).await;
}

pub(crate) fn account(value: &str) -> Facet {
    Facet::Account(name(value))
}

/// Rows of a facet across every shard, newest first in each shard, as `(row key:shard:ordinal,
/// action)`.
pub(crate) async fn list_actions(
    store: &dyn KVStore,
    facet: &Facet,
    limit: usize,
) -> Vec<(String, ActionTrace)> {
    let start = facet.bytes();
    let end = prefix_next(&start);

    store
        .scan(&start, &end, limit)
        .await
        .unwrap()
        .into_iter()
        .map(|row| {
            let (_, shard, ordinal) = Facet::decode_row(&row.key).unwrap();
            let (action, _) = decode_row_value(&row.value).unwrap();
            (
                format!("{}:{shard:02x}:{ordinal}", hex::encode(&row.key)),
                action.action_trace,
            )
        })
        .collect()
}

/// Global sequences of the rows of a facet in one shard, newest first
pub(crate) async fn global_sequences(
    store: &dyn KVStore,
    facet: &Facet,
    shard: ShardNum,
) -> Vec<u64> {
    let start = facet.shard_prefix(shard);
    let end = prefix_next(&start);

    store
        .scan(&start, &end, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|row| {
            let (action, _) = decode_row_value(&row.value).unwrap();
            action.global_sequence().unwrap()
        })
        .collect()
}
