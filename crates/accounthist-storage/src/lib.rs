//! Persistence layer of the account history.
//!
//! Everything goes through the [`KVStore`] contract: an ordered key value store with buffered
//! puts. Two backends are provided, [`RocksDBStore`] for deployments and [`InMemoryStore`] for
//! tests. The [`RWCache`] sits in front of either one during ingestion.

pub mod checkpoint;
pub mod errors;
#[cfg(feature = "inmemory")]
pub mod inmemory;
pub mod rwcache;
pub mod scan;
pub mod sequence;
pub mod store;

#[cfg(feature = "rocksdb")]
pub(crate) mod rocks;

#[cfg(test)]
mod tests;

pub use errors::StorageError;
#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryStore;
pub use rwcache::RWCache;
pub use scan::{FacetHead, FacetScanner, FacetSummary, ShardSummary};
pub use store::{with_timeout, KVStore, KeyValue, SharedStore, DATABASE_TIMEOUT};

#[cfg(feature = "rocksdb")]
pub use rocks::RocksDBStore;
