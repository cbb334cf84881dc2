//! This module is defining constant names for CFs

/// Every history row and shard checkpoint lives in this CF
pub(crate) const ACCOUNTHIST: &str = "accounthist";
