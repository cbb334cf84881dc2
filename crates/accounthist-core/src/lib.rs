//! Core types of the account history store.
//!
//! This crate holds everything that is shared between the injector, the purger and the query
//! service: the chain model delivered by the block source, the binary key layout, the facet
//! family and the values persisted next to each row.

pub mod chain;
pub mod checkpoint;
pub mod cursor;
pub mod errors;
pub mod facet;
pub mod keyer;
pub mod row;
pub mod sequence;

#[cfg(test)]
mod tests;

pub use chain::{ActionReceipt, ActionTrace, Block, Name, PermissionLevel, TransactionTrace};
pub use checkpoint::ShardCheckpoint;
pub use cursor::Cursor;
pub use facet::{ActionFilter, Collection, Facet, FacetFactory};
pub use keyer::RowKey;
pub use sequence::SequenceData;

/// Shard number, 0 is the live shard
pub type ShardNum = u8;

/// Per facet, per shard ordinal of a row (1-based)
pub type Ordinal = u64;
