//! Recovery of per facet cursors from the newest row of a shard.

use accounthist_core::keyer::prefix_next;
use accounthist_core::row::sequence_data_from_row;
use accounthist_core::{Facet, SequenceData, ShardNum};
use tracing::debug;

use crate::errors::StorageError;
use crate::store::{with_timeout, KVStore};

/// Newest sequence data of `facet` in the first shard at or above `shard` holding rows for it.
///
/// Returns the shard the data was found in. Fails with [`StorageError::NotFound`] when no shard
/// at or above `shard` has rows for the facet.
pub async fn latest_shard_seq_data_per_facet(
    store: &dyn KVStore,
    facet: &Facet,
    shard: ShardNum,
    max_entries: u64,
) -> Result<(SequenceData, ShardNum), StorageError> {
    let start_key = facet.shard_prefix(shard);
    let end_key = prefix_next(&facet.bytes());

    debug!(
        facet = %facet,
        shard,
        start_key = hex::encode(&start_key),
        end_key = hex::encode(&end_key),
        "Scanning latest sequence data"
    );

    scan_newest_row(store, &start_key, &end_key, max_entries).await
}

/// Newest sequence data of `facet` in exactly `shard`.
pub async fn shard_seq_data_per_facet(
    store: &dyn KVStore,
    facet: &Facet,
    shard: ShardNum,
    max_entries: u64,
) -> Result<SequenceData, StorageError> {
    let start_key = facet.shard_prefix(shard);
    let end_key = prefix_next(&start_key);

    debug!(
        facet = %facet,
        shard,
        start_key = hex::encode(&start_key),
        end_key = hex::encode(&end_key),
        "Reading last sequence data for shard"
    );

    scan_newest_row(store, &start_key, &end_key, max_entries)
        .await
        .map(|(sequence, _)| sequence)
}

async fn scan_newest_row(
    store: &dyn KVStore,
    start_key: &[u8],
    end_key: &[u8],
    max_entries: u64,
) -> Result<(SequenceData, ShardNum), StorageError> {
    let newest = with_timeout(store.scan(start_key, end_key, 1))
        .await?
        .into_iter()
        .next()
        .ok_or(StorageError::NotFound)?;

    let (_, shard, ordinal) = Facet::decode_row(&newest.key)?;
    let sequence = sequence_data_from_row(ordinal, &newest.value, max_entries)?;

    Ok((sequence, shard))
}
