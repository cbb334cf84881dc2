//! Terse builders for blocks, transaction traces and action traces.
//!
//! ```ignore
//! let mut sequence = AutoGlobalSequence::default();
//! let block = sequence.apply(block(
//!     "00000001aa",
//!     vec![trx_trace(vec![action_trace("some1:some:thing1")])],
//! ));
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use accounthist_core::chain::Action;
use accounthist_core::{ActionReceipt, ActionTrace, Block, PermissionLevel, TransactionTrace};

use crate::name;

/// 2006-01-02T15:04:05.5Z, far enough in the past to never be near real time
pub const DEFAULT_BLOCK_TIME_MS: u64 = 1_136_214_245_500;

static TRX_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Build a block out of an id whose first 8 hex characters are its number.
pub fn block(id: &str, transaction_traces: Vec<TransactionTrace>) -> Block {
    let number = block_num_from_id(id);

    Block {
        id: id.to_string(),
        number,
        previous_id: format!("{:08x}{}", number.saturating_sub(1), id.get(8..).unwrap_or("")),
        timestamp_ms: DEFAULT_BLOCK_TIME_MS,
        filtering_applied: false,
        transaction_traces,
    }
}

/// Same as [`block`] with a timestamp of now
pub fn near_real_time_block(id: &str, transaction_traces: Vec<TransactionTrace>) -> Block {
    let mut block = block(id, transaction_traces);
    block.timestamp_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(DEFAULT_BLOCK_TIME_MS);

    block
}

pub fn block_num_from_id(id: &str) -> u64 {
    id.get(..8)
        .and_then(|prefix| u64::from_str_radix(prefix, 16).ok())
        .unwrap_or_else(|| panic!("block id {id:?} must start with 8 hex characters"))
}

pub fn trx_trace(action_traces: Vec<ActionTrace>) -> TransactionTrace {
    let id = TRX_COUNTER.fetch_add(1, Ordering::Relaxed);

    TransactionTrace {
        id: format!("{id:064x}"),
        reverted: false,
        action_traces,
    }
}

pub fn reverted_trx_trace(action_traces: Vec<ActionTrace>) -> TransactionTrace {
    TransactionTrace {
        reverted: true,
        ..trx_trace(action_traces)
    }
}

/// Build an action trace out of `receiver:account:action`, or `receiver:action` when the
/// receiver is the contract itself.
///
/// The receipt is set with a global sequence of 0, see [`AutoGlobalSequence`] and
/// [`ActionTraceExt::with_global_sequence`].
pub fn action_trace(triplet: &str) -> ActionTrace {
    let parts: Vec<&str> = triplet.split(':').collect();
    let (receiver, account, action) = match parts.as_slice() {
        [receiver, action] => (*receiver, *receiver, *action),
        [receiver, account, action] => (*receiver, *account, *action),
        _ => panic!("invalid action triplet {triplet:?}"),
    };

    let receiver = name(receiver);

    ActionTrace {
        receiver,
        receipt: Some(ActionReceipt {
            receiver,
            global_sequence: 0,
        }),
        action: Action {
            account: name(account),
            name: name(action),
            authorization: Vec::new(),
            data: Vec::new(),
        },
        execution_index: 0,
        filtering_matched: false,
    }
}

pub trait ActionTraceExt {
    fn with_global_sequence(self, global_sequence: u64) -> Self;

    /// Add an `actor@permission` authorization, the permission defaulting to `active`
    fn authorized_by(self, authorization: &str) -> Self;

    fn without_receipt(self) -> Self;

    fn filtering_matched(self) -> Self;
}

impl ActionTraceExt for ActionTrace {
    fn with_global_sequence(mut self, global_sequence: u64) -> Self {
        if let Some(receipt) = self.receipt.as_mut() {
            receipt.global_sequence = global_sequence;
        }
        self
    }

    fn authorized_by(mut self, authorization: &str) -> Self {
        let (actor, permission) = authorization
            .split_once('@')
            .unwrap_or((authorization, "active"));

        self.action.authorization.push(PermissionLevel {
            actor: name(actor),
            permission: name(permission),
        });
        self
    }

    fn without_receipt(mut self) -> Self {
        self.receipt = None;
        self
    }

    fn filtering_matched(mut self) -> Self {
        self.filtering_matched = true;
        self
    }
}

/// Hands out global sequences 1, 2, 3... to every action with a receipt, across blocks.
#[derive(Debug, Default)]
pub struct AutoGlobalSequence {
    count: u64,
}

impl AutoGlobalSequence {
    pub fn apply(&mut self, mut block: Block) -> Block {
        for trx in &mut block.transaction_traces {
            for action in &mut trx.action_traces {
                if let Some(receipt) = action.receipt.as_mut() {
                    self.count += 1;
                    receipt.global_sequence = self.count;
                }
            }
        }

        block
    }

    pub fn last(&self) -> u64 {
        self.count
    }
}
