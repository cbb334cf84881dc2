//! Direct writes of history rows, bypassing the injector.

use accounthist_core::row::{encode_row_value, ActionRow};
use accounthist_core::{Facet, ShardNum};
use accounthist_storage::{KVStore, StorageError};

use crate::blocks::{action_trace, block, trx_trace, ActionTraceExt};

/// Write `count` rows for `facet` in `shard` with ordinals `1..=count` and global sequences
/// starting at `first_global_seq`, then flush.
///
/// Returns the written keys in store order, newest ordinal first.
pub async fn insert_rows(
    store: &dyn KVStore,
    facet: &Facet,
    shard: ShardNum,
    count: u64,
    first_global_seq: u64,
) -> Result<Vec<Vec<u8>>, StorageError> {
    let account = facet.account().to_string();
    let mut keys = Vec::with_capacity(count as usize);

    for ordinal in 1..=count {
        let action = action_trace(&format!("{account}:transfer"))
            .with_global_sequence(first_global_seq + ordinal - 1);
        let trx = trx_trace(vec![action.clone()]);
        let block = block("00000002aa", vec![trx.clone()]);

        let encoded = ActionRow::new(&block, &trx, &action).encode()?;
        let key = facet.row(shard, ordinal).into_vec();
        store.put(&key, &encode_row_value(&encoded, 0)).await?;
        keys.push(key);
    }

    store.flush_puts().await?;
    keys.reverse();

    Ok(keys)
}
