//! Value stored under each row key.
//!
//! ```text
//! [bincode(ActionRow)][last_deleted_ordinal: u64 BE]
//! ```
//!
//! The eviction high-water mark lives in a fixed-width suffix so it can be set on an action
//! that was serialized once for every subject of the block.

use serde::{Deserialize, Serialize};

use crate::chain::{ActionTrace, Block, TransactionTrace};
use crate::errors::RowError;
use crate::sequence::SequenceData;
use crate::Ordinal;

pub const ACTION_ROW_VERSION: u32 = 0;

const SUFFIX_LEN: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRow {
    pub version: u32,
    pub block_num: u64,
    pub block_id: String,
    pub block_time_ms: u64,
    pub transaction_id: String,
    pub action_trace: ActionTrace,
}

impl ActionRow {
    pub fn new(block: &Block, transaction: &TransactionTrace, action: &ActionTrace) -> Self {
        Self {
            version: ACTION_ROW_VERSION,
            block_num: block.number,
            block_id: block.id.clone(),
            block_time_ms: block.timestamp_ms,
            transaction_id: transaction.id.clone(),
            action_trace: action.clone(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, RowError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn global_sequence(&self) -> Result<u64, RowError> {
        self.action_trace
            .global_sequence()
            .ok_or(RowError::MissingReceipt)
    }
}

/// Append the eviction high-water mark to an already encoded [`ActionRow`].
pub fn encode_row_value(encoded_action: &[u8], last_deleted_ordinal: Ordinal) -> Vec<u8> {
    let mut value = Vec::with_capacity(encoded_action.len() + SUFFIX_LEN);
    value.extend_from_slice(encoded_action);
    value.extend_from_slice(&last_deleted_ordinal.to_be_bytes());
    value
}

/// Split a row value into its action and its eviction high-water mark.
pub fn decode_row_value(value: &[u8]) -> Result<(ActionRow, Ordinal), RowError> {
    if value.len() < SUFFIX_LEN {
        return Err(RowError::TooShort(value.len()));
    }

    let (encoded_action, suffix) = value.split_at(value.len() - SUFFIX_LEN);
    let mut last_deleted = [0u8; SUFFIX_LEN];
    last_deleted.copy_from_slice(suffix);

    let action: ActionRow = bincode::deserialize(encoded_action)?;

    Ok((action, u64::from_be_bytes(last_deleted)))
}

/// Rebuild the cursor of a facet from its newest row.
///
/// `max_entries` is not part of the row and is left untouched.
pub fn sequence_data_from_row(
    ordinal: Ordinal,
    value: &[u8],
    max_entries: u64,
) -> Result<SequenceData, RowError> {
    let (action, last_deleted_ordinal) = decode_row_value(value)?;

    Ok(SequenceData {
        current_ordinal: ordinal,
        last_global_seq: action.global_sequence()?,
        last_deleted_ordinal,
        max_entries,
    })
}
