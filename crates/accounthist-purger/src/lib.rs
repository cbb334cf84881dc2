//! Maintenance sweep bounding the total history kept for every facet.
//!
//! Shards are filled in order, each one with its own retention window. Once the actions recorded
//! for a facet in its lowest shards add up to the limit, every row of that facet living in a
//! higher shard can never be served and is deleted.

use accounthist_core::keyer::prefix_next;
use accounthist_core::{Collection, Facet, ShardNum};
use accounthist_metrics::{PURGER_FACETS_PURGED_TOTAL, PURGER_PURGED_KEYS_TOTAL};
use accounthist_storage::sequence::latest_shard_seq_data_per_facet;
use accounthist_storage::{with_timeout, FacetHead, FacetScanner, SharedStore, StorageError};
use tracing::{debug, info};

pub mod errors;

#[cfg(test)]
mod tests;

pub use errors::PurgerError;

/// Number of keys read and deleted at once while purging a facet
pub const DEFAULT_PURGE_BATCH_SIZE: usize = 1000;

/// Where the limit was crossed for one facet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PurgeDecision {
    /// Highest shard kept, rows of every shard above it are deleted
    pub above_shard: ShardNum,
    pub seen_actions: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PurgeReport {
    pub facets_scanned: u64,
    pub facets_purged: u64,
    /// Keys deleted, or that would have been deleted on a dry run
    pub keys_deleted: u64,
}

pub struct Purger {
    store: SharedStore,
    collection: Collection,
    dry_run: bool,
    batch_size: usize,
}

impl Purger {
    pub fn new(store: SharedStore, collection: Collection) -> Self {
        Self {
            store,
            collection,
            dry_run: false,
            batch_size: DEFAULT_PURGE_BATCH_SIZE,
        }
    }

    /// Count the keys to delete without deleting them
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Purge every facet of the collection whose history exceeds `max_entries`.
    ///
    /// `on_purge` is called with the facet, the highest shard kept and the number of actions
    /// seen up to it, before the rows are deleted.
    pub async fn purge<F>(
        &self,
        max_entries: u64,
        mut on_purge: F,
    ) -> Result<PurgeReport, PurgerError>
    where
        F: FnMut(&Facet, ShardNum, u64),
    {
        if max_entries == 0 {
            return Err(PurgerError::InvalidMaxEntries);
        }
        if self.batch_size == 0 {
            return Err(PurgerError::InvalidBatchSize);
        }

        info!(
            collection = %self.collection,
            max_entries,
            dry_run = self.dry_run,
            "Purging facets exceeding their max entries"
        );

        let mut report = PurgeReport::default();
        let mut scanner =
            FacetScanner::new(&*self.store, self.collection).with_max_entries(max_entries);

        while let Some(head) = scanner.next().await? {
            report.facets_scanned += 1;

            let Some(decision) = self.find_purge_boundary(&head, max_entries).await? else {
                continue;
            };

            on_purge(&head.facet, decision.above_shard, decision.seen_actions);

            let deleted = self.purge_above_shard(&head.facet, decision.above_shard).await?;
            report.facets_purged += 1;
            report.keys_deleted += deleted;
        }

        info!(
            facets_scanned = report.facets_scanned,
            facets_purged = report.facets_purged,
            keys_deleted = report.keys_deleted,
            dry_run = self.dry_run,
            "Purge completed"
        );

        Ok(report)
    }

    /// Walk the shards of a facet upward from its lowest one, accumulating the actions recorded
    /// in each, until `max_entries` is reached or no higher shard holds rows.
    pub async fn find_purge_boundary(
        &self,
        head: &FacetHead,
        max_entries: u64,
    ) -> Result<Option<PurgeDecision>, PurgerError> {
        let facet = &head.facet;
        let mut shard = head.shard;
        let mut seen_actions = head.sequence.current_ordinal;

        loop {
            if seen_actions >= max_entries {
                info!(
                    facet = %facet,
                    max_entries,
                    seen_actions,
                    shard_num = shard,
                    "Facet action count exceeds max entries"
                );

                return Ok(Some(PurgeDecision {
                    above_shard: shard,
                    seen_actions,
                }));
            }

            let Some(next_shard) = shard.checked_add(1) else {
                return Ok(None);
            };

            match latest_shard_seq_data_per_facet(&*self.store, facet, next_shard, 0).await {
                Ok((sequence, found)) => {
                    seen_actions += sequence.current_ordinal;
                    shard = found;
                }
                Err(StorageError::NotFound) => {
                    debug!(
                        facet = %facet,
                        seen_actions,
                        last_shard_num = shard,
                        "Facet has not been maxed out"
                    );

                    return Ok(None);
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    /// Delete every row of `facet` in the shards strictly above `shard`.
    ///
    /// Returns the number of keys deleted, or found on a dry run.
    pub async fn purge_above_shard(
        &self,
        facet: &Facet,
        shard: ShardNum,
    ) -> Result<u64, PurgerError> {
        let Some(first_purged_shard) = shard.checked_add(1) else {
            return Ok(0);
        };

        let mut start_key = facet.shard_prefix(first_purged_shard);
        let end_key = prefix_next(&facet.bytes());

        info!(
            facet = %facet,
            shard_num = shard,
            start_key = hex::encode(&start_key),
            end_key = hex::encode(&end_key),
            dry_run = self.dry_run,
            "Purging facet rows above shard"
        );

        let mut count = 0u64;
        loop {
            let rows =
                with_timeout(self.store.scan(&start_key, &end_key, self.batch_size)).await?;
            let Some(last) = rows.last() else {
                break;
            };

            // Deletes may be buffered by the store, resume right after the last key seen.
            start_key = last.key.clone();
            start_key.push(0);

            let keys: Vec<Vec<u8>> = rows.into_iter().map(|row| row.key).collect();
            count += keys.len() as u64;

            if !self.dry_run {
                with_timeout(self.store.batch_delete(&keys)).await?;
                PURGER_PURGED_KEYS_TOTAL.inc_by(keys.len() as u64);
            }
        }

        if !self.dry_run {
            with_timeout(self.store.flush_puts()).await?;
            PURGER_FACETS_PURGED_TOTAL.inc();
        }

        info!(
            facet = %facet,
            shard_num = shard,
            deleted_keys_count = count,
            dry_run = self.dry_run,
            "Facet purged above shard"
        );

        Ok(count)
    }
}
