use prometheus::{register_int_counter_with_registry, IntCounter};

use lazy_static::lazy_static;

use crate::ACCOUNTHIST_METRIC_REGISTRY;

lazy_static! {
    pub static ref PURGER_PURGED_KEYS_TOTAL: IntCounter = register_int_counter_with_registry!(
        "purger_purged_keys_total",
        "Number of history rows deleted by the purger.",
        ACCOUNTHIST_METRIC_REGISTRY
    )
    .unwrap();
    pub static ref PURGER_FACETS_PURGED_TOTAL: IntCounter = register_int_counter_with_registry!(
        "purger_facets_purged_total",
        "Number of facets with shards purged.",
        ACCOUNTHIST_METRIC_REGISTRY
    )
    .unwrap();
}
