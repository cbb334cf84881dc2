use prometheus::{
    register_gauge_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Gauge, IntCounter, IntGauge,
};

use lazy_static::lazy_static;

use crate::ACCOUNTHIST_METRIC_REGISTRY;

lazy_static! {
    pub static ref INJECTOR_HEAD_BLOCK_NUMBER: IntGauge = register_int_gauge_with_registry!(
        "injector_head_block_number",
        "Number of the last block received from the block source.",
        ACCOUNTHIST_METRIC_REGISTRY
    )
    .unwrap();
    pub static ref INJECTOR_HEAD_BLOCK_TIME_DRIFT: Gauge = register_gauge_with_registry!(
        "injector_head_block_time_drift_seconds",
        "Seconds elapsed between the production of the last received block and now.",
        ACCOUNTHIST_METRIC_REGISTRY
    )
    .unwrap();
    pub static ref INJECTOR_BLOCKS_PROCESSED_TOTAL: IntCounter =
        register_int_counter_with_registry!(
            "injector_blocks_processed_total",
            "Number of irreversible blocks ingested.",
            ACCOUNTHIST_METRIC_REGISTRY
        )
        .unwrap();
    pub static ref INJECTOR_ACTIONS_WRITTEN_TOTAL: IntCounter =
        register_int_counter_with_registry!(
            "injector_actions_written_total",
            "Number of history rows written.",
            ACCOUNTHIST_METRIC_REGISTRY
        )
        .unwrap();
    pub static ref INJECTOR_ACTIONS_DELETED_TOTAL: IntCounter =
        register_int_counter_with_registry!(
            "injector_actions_deleted_total",
            "Number of history rows evicted from the retention window.",
            ACCOUNTHIST_METRIC_REGISTRY
        )
        .unwrap();
    pub static ref INJECTOR_FLUSH_TOTAL: IntCounter = register_int_counter_with_registry!(
        "injector_flush_total",
        "Number of flushes of the write buffer.",
        ACCOUNTHIST_METRIC_REGISTRY
    )
    .unwrap();
}
