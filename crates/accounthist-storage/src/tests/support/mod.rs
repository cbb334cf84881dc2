use std::path::PathBuf;
use std::sync::Arc;

use accounthist_core::chain::{Action, ActionReceipt, ActionTrace, Block, Name, TransactionTrace};
use accounthist_core::row::{encode_row_value, ActionRow};
use accounthist_core::{Facet, Ordinal, ShardNum};
use rstest::fixture;

use crate::{InMemoryStore, KVStore, RocksDBStore};

pub(crate) mod recording;

#[fixture]
pub(crate) fn memory_store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

#[fixture]
pub(crate) fn database_path() -> PathBuf {
    PathBuf::from(format!("./tests/databases/{}", uuid::Uuid::new_v4()))
}

#[fixture]
pub(crate) fn rocks_store(database_path: PathBuf) -> Arc<RocksDBStore> {
    Arc::new(RocksDBStore::open(&database_path).unwrap())
}

pub(crate) fn name(value: &str) -> Name {
    value.parse().unwrap()
}

pub(crate) fn account(value: &str) -> Facet {
    Facet::Account(name(value))
}

pub(crate) fn row_value(receiver: Facet, global_sequence: u64, last_deleted: Ordinal) -> Vec<u8> {
    let receiver = receiver.account();
    let trace = ActionTrace {
        receiver,
        receipt: Some(ActionReceipt {
            receiver,
            global_sequence,
        }),
        action: Action {
            account: name("eosio.token"),
            name: name("transfer"),
            authorization: vec![],
            data: vec![],
        },
        execution_index: 0,
        filtering_matched: true,
    };

    let row = ActionRow::new(&Block::default(), &TransactionTrace::default(), &trace);
    encode_row_value(&row.encode().unwrap(), last_deleted)
}

/// Write ordinals `1..=count` of `facet` in `shard`, global sequences starting at
/// `first_global_seq`.
pub(crate) async fn insert_rows(
    store: &dyn KVStore,
    facet: Facet,
    shard: ShardNum,
    count: u64,
    first_global_seq: u64,
) {
    for ordinal in 1..=count {
        let key = facet.row(shard, ordinal);
        let value = row_value(facet, first_global_seq + ordinal - 1, 0);
        store.put(key.as_bytes(), &value).await.unwrap();
    }

    store.flush_puts().await.unwrap();
}
