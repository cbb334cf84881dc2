use std::sync::Arc;

use accounthist_core::{Collection, Facet};
use rstest::rstest;
use test_log::test;

use crate::scan::{facet_summary, scan_facets, FacetScanner};
use crate::tests::support::{account, insert_rows, memory_store, name};
use crate::InMemoryStore;

#[rstest]
#[test(tokio::test)]
async fn scanner_yields_each_facet_once(memory_store: Arc<InMemoryStore>) {
    let store = memory_store.as_ref();
    insert_rows(store, account("alice"), 0, 12, 41).await;
    insert_rows(store, account("alice"), 1, 8, 8).await;
    insert_rows(store, account("bob"), 1, 7, 16).await;
    insert_rows(store, account("carol"), 2, 1, 7).await;
    let pair = Facet::AccountContract {
        account: name("alice"),
        contract: name("eosio.token"),
    };
    insert_rows(store, pair, 0, 4, 100).await;

    let mut scanner = FacetScanner::new(store, Collection::Account).with_max_entries(10);
    let mut seen = Vec::new();
    while let Some(head) = scanner.next().await.unwrap() {
        seen.push((head.facet, head.shard, head.sequence.current_ordinal));
        assert_eq!(head.sequence.max_entries, 10);
    }

    assert_eq!(
        seen,
        vec![
            (account("alice"), 0, 12),
            (account("bob"), 1, 7),
            (account("carol"), 2, 1),
        ]
    );

    let pairs = scan_facets(store, Collection::AccountContract, 0).await.unwrap();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pairs[0].facet, pair);

    assert_eq!(scan_facets(store, Collection::Account, 2).await.unwrap().len(), 2);
}

#[rstest]
#[test(tokio::test)]
async fn summary_lists_every_shard(memory_store: Arc<InMemoryStore>) {
    let store = memory_store.as_ref();
    let alice = account("alice");
    insert_rows(store, alice, 0, 12, 41).await;
    insert_rows(store, alice, 1, 8, 8).await;
    insert_rows(store, alice, 3, 3, 1).await;
    insert_rows(store, account("bob"), 2, 3, 1).await;

    let summary = facet_summary(store, &alice).await.unwrap();

    let shards: Vec<_> = summary
        .shards
        .iter()
        .map(|shard| (shard.shard, shard.sequence.current_ordinal))
        .collect();
    assert_eq!(shards, vec![(0, 12), (1, 8), (3, 3)]);
    assert_eq!(summary.total_actions(), 23);

    let empty = facet_summary(store, &account("dave")).await.unwrap();
    assert!(empty.shards.is_empty());
}
