use accounthist_core::keyer::prefix_next;
use accounthist_core::row::sequence_data_from_row;
use accounthist_core::{Collection, Facet, SequenceData, ShardNum};
use tracing::debug;

use crate::errors::StorageError;
use crate::sequence::latest_shard_seq_data_per_facet;
use crate::store::{with_timeout, KVStore};

/// First row met for a facet: its lowest shard and the newest ordinal in it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetHead {
    pub facet: Facet,
    pub shard: ShardNum,
    pub sequence: SequenceData,
}

/// Walks every facet of a collection, one scan of a single row per facet.
pub struct FacetScanner<'a> {
    store: &'a dyn KVStore,
    next_key: Vec<u8>,
    end_key: Vec<u8>,
    max_entries: u64,
    done: bool,
}

impl<'a> FacetScanner<'a> {
    pub fn new(store: &'a dyn KVStore, collection: Collection) -> Self {
        Self {
            store,
            next_key: collection.start_key(),
            end_key: collection.end_key(),
            max_entries: 0,
            done: false,
        }
    }

    /// Value reported as `max_entries` in the returned sequence data
    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub async fn next(&mut self) -> Result<Option<FacetHead>, StorageError> {
        if self.done {
            return Ok(None);
        }

        let Some(row) = with_timeout(self.store.scan(&self.next_key, &self.end_key, 1))
            .await?
            .into_iter()
            .next()
        else {
            self.done = true;
            return Ok(None);
        };

        let (facet, shard, ordinal) = Facet::decode_row(&row.key)?;
        let sequence = sequence_data_from_row(ordinal, &row.value, self.max_entries)?;

        self.next_key = prefix_next(&facet.bytes());
        if self.next_key.is_empty() {
            self.done = true;
        }

        Ok(Some(FacetHead {
            facet,
            shard,
            sequence,
        }))
    }
}

/// Collect up to `limit` facets of a collection, 0 meaning all of them.
pub async fn scan_facets(
    store: &dyn KVStore,
    collection: Collection,
    limit: usize,
) -> Result<Vec<FacetHead>, StorageError> {
    let mut scanner = FacetScanner::new(store, collection);
    let mut heads = Vec::new();

    while let Some(head) = scanner.next().await? {
        heads.push(head);
        if limit != 0 && heads.len() >= limit {
            break;
        }
    }

    Ok(heads)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardSummary {
    pub shard: ShardNum,
    pub sequence: SequenceData,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FacetSummary {
    pub facet: Facet,
    pub shards: Vec<ShardSummary>,
}

impl FacetSummary {
    /// Number of actions ever recorded for the facet across its shards
    pub fn total_actions(&self) -> u64 {
        self.shards
            .iter()
            .map(|summary| summary.sequence.current_ordinal)
            .sum()
    }
}

/// Newest sequence data of every shard holding rows for `facet`, in shard order.
pub async fn facet_summary(
    store: &dyn KVStore,
    facet: &Facet,
) -> Result<FacetSummary, StorageError> {
    let mut shards = Vec::new();
    let mut shard: ShardNum = 0;

    loop {
        match latest_shard_seq_data_per_facet(store, facet, shard, 0).await {
            Ok((sequence, found)) => {
                debug!(
                    facet = %facet,
                    shard = found,
                    ordinal = sequence.current_ordinal,
                    "Found shard"
                );
                shards.push(ShardSummary {
                    shard: found,
                    sequence,
                });

                match found.checked_add(1) {
                    Some(next) => shard = next,
                    None => break,
                }
            }
            Err(StorageError::NotFound) => break,
            Err(error) => return Err(error),
        }
    }

    Ok(FacetSummary {
        facet: *facet,
        shards,
    })
}
