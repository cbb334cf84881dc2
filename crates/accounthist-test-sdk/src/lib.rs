//! Builders and fixtures shared by the tests of the workspace.

pub mod blocks;
pub mod rows;
pub mod storage;

use accounthist_core::Name;

/// Parse a name, panicking on invalid input
pub fn name(value: &str) -> Name {
    value
        .parse()
        .unwrap_or_else(|error| panic!("invalid name {value:?}: {error}"))
}
