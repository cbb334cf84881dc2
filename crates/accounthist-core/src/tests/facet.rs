use crate::chain::{Action, ActionReceipt, ActionTrace, Block, Name};
use crate::errors::KeyError;
use crate::facet::{ActionFilter, Collection, Facet, FacetFactory};

fn name(value: &str) -> Name {
    value.parse().unwrap()
}

fn trace(receiver: &str, account: &str, action: &str) -> ActionTrace {
    ActionTrace {
        receiver: name(receiver),
        receipt: Some(ActionReceipt {
            receiver: name(receiver),
            global_sequence: 1,
        }),
        action: Action {
            account: name(account),
            name: name(action),
            authorization: vec![],
            data: vec![],
        },
        execution_index: 0,
        filtering_matched: true,
    }
}

#[test]
fn account_factory_builds_account_facets() {
    let factory = FacetFactory::new(Collection::Account);
    let act = trace("alice", "eosio.token", "transfer");

    let facet = factory.new_facet(&Block::default(), &act, name("alice"));

    assert_eq!(facet, Facet::Account(name("alice")));
    assert_eq!(facet.to_string(), "alice");
    assert_eq!(factory.checkpoint_key(7), vec![0x01, 7]);
    assert!(factory.action_filter(&trace("alice", "eosio", "newaccount")));
}

#[test]
fn account_contract_factory_uses_the_action_contract() {
    let factory = FacetFactory::new(Collection::AccountContract);
    let act = trace("alice", "eosio.token", "transfer");

    let facet = factory.new_facet(&Block::default(), &act, name("bob"));

    assert_eq!(
        facet,
        Facet::AccountContract {
            account: name("bob"),
            contract: name("eosio.token")
        }
    );
    assert_eq!(facet.to_string(), "bob:eosio.token");
    assert_eq!(factory.checkpoint_key(0), vec![0x04, 0]);
}

#[test]
fn account_contract_factory_only_keeps_transfers_by_default() {
    let factory = FacetFactory::new(Collection::AccountContract);

    assert!(factory.action_filter(&trace("alice", "eosio.token", "transfer")));
    assert!(!factory.action_filter(&trace("alice", "eosio.token", "issue")));

    let factory = factory.with_action_filter(ActionFilter::All);
    assert!(factory.action_filter(&trace("alice", "eosio.token", "issue")));
}

#[test]
fn rows_decode_back_to_their_facet() {
    let facets = [
        Facet::Account(name("alice")),
        Facet::AccountContract {
            account: name("alice"),
            contract: name("eosio.token"),
        },
    ];

    for facet in facets {
        let key = facet.row(4, 12);
        assert_eq!(Facet::decode_row(key.as_bytes()).unwrap(), (facet, 4, 12));
        assert_eq!(Facet::from_bytes(&facet.bytes()).unwrap(), facet);
        assert!(key.as_bytes().starts_with(&facet.shard_prefix(4)));

        let factory = FacetFactory::new(facet.collection());
        assert_eq!(factory.decode_row(key.as_bytes()).unwrap(), (facet, 4, 12));
    }
}

#[test]
fn factory_rejects_rows_of_another_collection() {
    let factory = FacetFactory::new(Collection::Account);
    let key = Facet::AccountContract {
        account: name("alice"),
        contract: name("eosio.token"),
    }
    .row(0, 1);

    assert_eq!(
        factory.decode_row(key.as_bytes()),
        Err(KeyError::CollectionMismatch {
            expected: 0x02,
            actual: 0x03
        })
    );
}

#[test]
fn collection_keyspace_bounds() {
    let facet = Facet::Account(name("zzzzzzzzzzzzj"));
    let key = facet.row(255, 0);

    assert!(key.as_bytes() >= Collection::Account.start_key().as_slice());
    assert!(key.as_bytes() < Collection::Account.end_key().as_slice());
    assert_eq!(
        "account-contract".parse::<Collection>(),
        Ok(Collection::AccountContract)
    );
    assert!("wallet".parse::<Collection>().is_err());
}
