mod checkpoint;
mod rwcache;
mod scan;
pub(crate) mod support;
