use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::chain::{ActionTrace, Block, Name};
use crate::errors::KeyError;
use crate::keyer::{self, RowKey};
use crate::{Ordinal, ShardNum};

/// Family of tracked timelines, one per deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Collection {
    #[default]
    Account,
    AccountContract,
}

impl Collection {
    /// Tag of the rows of this collection
    pub const fn row_tag(&self) -> u8 {
        match self {
            Collection::Account => keyer::PREFIX_ACCOUNT,
            Collection::AccountContract => keyer::PREFIX_ACCOUNT_CONTRACT,
        }
    }

    /// Tag of the shard checkpoints of this collection
    pub const fn checkpoint_tag(&self) -> u8 {
        match self {
            Collection::Account => keyer::PREFIX_ACCOUNT_CHECKPOINT,
            Collection::AccountContract => keyer::PREFIX_ACCOUNT_CONTRACT_CHECKPOINT,
        }
    }

    pub fn from_row_tag(tag: u8) -> Result<Self, KeyError> {
        match tag {
            keyer::PREFIX_ACCOUNT => Ok(Collection::Account),
            keyer::PREFIX_ACCOUNT_CONTRACT => Ok(Collection::AccountContract),
            other => Err(KeyError::UnknownCollection(other)),
        }
    }

    /// Smallest key of the collection keyspace
    pub fn start_key(&self) -> Vec<u8> {
        vec![self.row_tag()]
    }

    /// First key after the collection keyspace
    pub fn end_key(&self) -> Vec<u8> {
        vec![self.row_tag() + 1]
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "account" => Ok(Collection::Account),
            "account-contract" => Ok(Collection::AccountContract),
            other => Err(format!(
                "unknown mode {other:?}, expected `account` or `account-contract`"
            )),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Account => f.write_str("account"),
            Collection::AccountContract => f.write_str("account-contract"),
        }
    }
}

/// Identity of one tracked timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Facet {
    Account(Name),
    AccountContract { account: Name, contract: Name },
}

impl Facet {
    pub fn collection(&self) -> Collection {
        match self {
            Facet::Account(_) => Collection::Account,
            Facet::AccountContract { .. } => Collection::AccountContract,
        }
    }

    pub fn account(&self) -> Name {
        match self {
            Facet::Account(account) | Facet::AccountContract { account, .. } => *account,
        }
    }

    pub fn row(&self, shard: ShardNum, ordinal: Ordinal) -> RowKey {
        match self {
            Facet::Account(account) => keyer::encode_account_key(*account, shard, ordinal),
            Facet::AccountContract { account, contract } => {
                keyer::encode_account_contract_key(*account, *contract, shard, ordinal)
            }
        }
    }

    /// Prefix shared by every row of this facet, across all shards
    pub fn bytes(&self) -> Vec<u8> {
        match self {
            Facet::Account(account) => keyer::encode_account_prefix(*account),
            Facet::AccountContract { account, contract } => {
                keyer::encode_account_contract_prefix(*account, *contract)
            }
        }
    }

    /// Prefix shared by every row of this facet in one shard
    pub fn shard_prefix(&self, shard: ShardNum) -> Vec<u8> {
        let mut prefix = self.bytes();
        prefix.push(shard);
        prefix
    }

    /// Decode any row key, whatever its collection
    pub fn decode_row(key: &[u8]) -> Result<(Facet, ShardNum, Ordinal), KeyError> {
        let tag = *key.first().ok_or(KeyError::Empty)?;
        match Collection::from_row_tag(tag)? {
            Collection::Account => {
                let (account, shard, ordinal) = keyer::decode_account_key(key)?;
                Ok((Facet::Account(account), shard, ordinal))
            }
            Collection::AccountContract => {
                let (account, contract, shard, ordinal) =
                    keyer::decode_account_contract_key(key)?;
                Ok((Facet::AccountContract { account, contract }, shard, ordinal))
            }
        }
    }

    /// Rebuild a facet from its prefix bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Facet, KeyError> {
        let tag = *bytes.first().ok_or(KeyError::Empty)?;
        let collection = Collection::from_row_tag(tag)?;
        let expected = match collection {
            Collection::Account => keyer::ACCOUNT_PREFIX_LEN,
            Collection::AccountContract => keyer::ACCOUNT_CONTRACT_PREFIX_LEN,
        };

        if bytes.len() != expected {
            return Err(KeyError::InvalidLength {
                collection: tag,
                expected,
                actual: bytes.len(),
            });
        }

        // Pad with a zero shard and ordinal to reuse the row decoders
        let mut key = bytes.to_vec();
        key.push(0);
        key.extend_from_slice(&[0u8; 8]);

        Facet::decode_row(&key).map(|(facet, _, _)| facet)
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facet::Account(account) => write!(f, "{account}"),
            Facet::AccountContract { account, contract } => write!(f, "{account}:{contract}"),
        }
    }
}

/// Inclusion policy applied to each matched action before it is recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ActionFilter {
    #[default]
    All,
    ActionName(Name),
}

impl ActionFilter {
    pub fn accepts(&self, action: &ActionTrace) -> bool {
        match self {
            ActionFilter::All => true,
            ActionFilter::ActionName(name) => action.action.name == *name,
        }
    }
}

/// Builds the facets of one deployment.
#[derive(Clone, Debug)]
pub struct FacetFactory {
    collection: Collection,
    filter: ActionFilter,
}

impl FacetFactory {
    /// Account-contract deployments only record `transfer` actions unless told otherwise.
    pub fn new(collection: Collection) -> Self {
        let filter = match collection {
            Collection::Account => ActionFilter::All,
            Collection::AccountContract => {
                ActionFilter::ActionName(Name::new(TRANSFER_ACTION_NAME))
            }
        };

        Self { collection, filter }
    }

    pub fn with_action_filter(mut self, filter: ActionFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    pub fn new_facet(&self, _block: &Block, action: &ActionTrace, subject: Name) -> Facet {
        match self.collection {
            Collection::Account => Facet::Account(subject),
            Collection::AccountContract => Facet::AccountContract {
                account: subject,
                contract: action.action.account,
            },
        }
    }

    pub fn decode_row(&self, key: &[u8]) -> Result<(Facet, ShardNum, Ordinal), KeyError> {
        let tag = *key.first().ok_or(KeyError::Empty)?;
        if tag != self.collection.row_tag() {
            return Err(KeyError::CollectionMismatch {
                expected: self.collection.row_tag(),
                actual: tag,
            });
        }

        Facet::decode_row(key)
    }

    pub fn checkpoint_key(&self, shard: ShardNum) -> Vec<u8> {
        keyer::encode_checkpoint_key(self.collection.checkpoint_tag(), shard)
    }

    pub fn action_filter(&self, action: &ActionTrace) -> bool {
        self.filter.accepts(action)
    }
}

/// `transfer`
const TRANSFER_ACTION_NAME: u64 = 0xcdcd_3c2d_5700_0000;
