//! Query side of the account history.
//!
//! The history of a facet is the concatenation of its shards in shard order, each one newest
//! first. A single forward scan over the facet key range yields it in that order, and the cursor
//! of a row resumes the scan right after it, possibly in a later shard.

pub mod errors;
mod query;

#[cfg(test)]
mod tests;

pub use errors::ApiError;
pub use query::{ActionResponse, ActionStream, ActionsPage, ActionsRequest, QueryService};
