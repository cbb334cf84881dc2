//! Binary layout of every key written by the store.
//!
//! ```text
//! account checkpoint           [0x01][shard]
//! account row                  [0x02][account: u64 BE][shard][!ordinal: u64 BE]
//! account-contract row         [0x03][account: u64 BE][contract: u64 BE][shard][!ordinal: u64 BE]
//! account-contract checkpoint  [0x04][shard]
//! ```
//!
//! The ordinal is stored bit-complemented so that, inside one shard, the newest row is the
//! first one met by a forward scan.

use std::fmt;

use crate::chain::Name;
use crate::errors::KeyError;
use crate::{Ordinal, ShardNum};

pub const PREFIX_ACCOUNT_CHECKPOINT: u8 = 0x01;
pub const PREFIX_ACCOUNT: u8 = 0x02;
pub const PREFIX_ACCOUNT_CONTRACT: u8 = 0x03;
pub const PREFIX_ACCOUNT_CONTRACT_CHECKPOINT: u8 = 0x04;

pub const CHECKPOINT_KEY_LEN: usize = 1 + 1;
pub const ACCOUNT_PREFIX_LEN: usize = 1 + 8;
pub const ACCOUNT_KEY_LEN: usize = ACCOUNT_PREFIX_LEN + 1 + 8;
pub const ACCOUNT_CONTRACT_PREFIX_LEN: usize = 1 + 8 + 8;
pub const ACCOUNT_CONTRACT_KEY_LEN: usize = ACCOUNT_CONTRACT_PREFIX_LEN + 1 + 8;

/// Fully encoded key of one history row.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowKey(Vec<u8>);

impl RowKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for RowKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<RowKey> for Vec<u8> {
    fn from(key: RowKey) -> Self {
        key.0
    }
}

impl fmt::Debug for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowKey({})", hex::encode(&self.0))
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

pub fn encode_account_prefix(account: Name) -> Vec<u8> {
    let mut key = Vec::with_capacity(ACCOUNT_KEY_LEN);
    key.push(PREFIX_ACCOUNT);
    key.extend_from_slice(&account.to_be_bytes());
    key
}

pub fn encode_account_key(account: Name, shard: ShardNum, ordinal: Ordinal) -> RowKey {
    let mut key = encode_account_prefix(account);
    key.push(shard);
    key.extend_from_slice(&(!ordinal).to_be_bytes());
    RowKey(key)
}

pub fn decode_account_key(key: &[u8]) -> Result<(Name, ShardNum, Ordinal), KeyError> {
    check_key(key, PREFIX_ACCOUNT, ACCOUNT_KEY_LEN)?;

    let account = Name::from_be_bytes(read_u64(&key[1..9]));
    let shard = key[9];
    let ordinal = !u64::from_be_bytes(read_u64(&key[10..18]));

    Ok((account, shard, ordinal))
}

pub fn encode_account_contract_prefix(account: Name, contract: Name) -> Vec<u8> {
    let mut key = Vec::with_capacity(ACCOUNT_CONTRACT_KEY_LEN);
    key.push(PREFIX_ACCOUNT_CONTRACT);
    key.extend_from_slice(&account.to_be_bytes());
    key.extend_from_slice(&contract.to_be_bytes());
    key
}

pub fn encode_account_contract_key(
    account: Name,
    contract: Name,
    shard: ShardNum,
    ordinal: Ordinal,
) -> RowKey {
    let mut key = encode_account_contract_prefix(account, contract);
    key.push(shard);
    key.extend_from_slice(&(!ordinal).to_be_bytes());
    RowKey(key)
}

pub fn decode_account_contract_key(
    key: &[u8],
) -> Result<(Name, Name, ShardNum, Ordinal), KeyError> {
    check_key(key, PREFIX_ACCOUNT_CONTRACT, ACCOUNT_CONTRACT_KEY_LEN)?;

    let account = Name::from_be_bytes(read_u64(&key[1..9]));
    let contract = Name::from_be_bytes(read_u64(&key[9..17]));
    let shard = key[17];
    let ordinal = !u64::from_be_bytes(read_u64(&key[18..26]));

    Ok((account, contract, shard, ordinal))
}

pub fn encode_checkpoint_key(collection_tag: u8, shard: ShardNum) -> Vec<u8> {
    vec![collection_tag, shard]
}

pub fn is_checkpoint_key(key: &[u8]) -> bool {
    matches!(
        key.first(),
        Some(&PREFIX_ACCOUNT_CHECKPOINT) | Some(&PREFIX_ACCOUNT_CONTRACT_CHECKPOINT)
    ) && key.len() == CHECKPOINT_KEY_LEN
}

/// Smallest key strictly greater than every key starting with `prefix`.
///
/// Returns an empty vector when no such key exists (prefix made only of `0xff`), which scans
/// interpret as "no upper bound".
pub fn prefix_next(prefix: &[u8]) -> Vec<u8> {
    let mut next = prefix.to_vec();
    while let Some(last) = next.pop() {
        if last < u8::MAX {
            next.push(last + 1);
            return next;
        }
    }

    next
}

fn check_key(key: &[u8], expected_tag: u8, expected_len: usize) -> Result<(), KeyError> {
    let tag = *key.first().ok_or(KeyError::Empty)?;
    if tag != expected_tag {
        return Err(KeyError::CollectionMismatch {
            expected: expected_tag,
            actual: tag,
        });
    }

    if key.len() != expected_len {
        return Err(KeyError::InvalidLength {
            collection: tag,
            expected: expected_len,
            actual: key.len(),
        });
    }

    Ok(())
}

fn read_u64(bytes: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(bytes);
    out
}
