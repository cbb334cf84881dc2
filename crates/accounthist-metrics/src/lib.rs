use prometheus::{Encoder, Registry, TextEncoder};

use lazy_static::lazy_static;

mod injector;
mod purger;

pub use injector::*;
pub use purger::*;


lazy_static! {
    pub static ref ACCOUNTHIST_METRIC_REGISTRY: Registry =
        Registry::new_custom(Some("accounthist".to_string()), None).unwrap();
}

/// Render every registered metric in the prometheus text format
pub fn gather_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();

    let metric_families = ACCOUNTHIST_METRIC_REGISTRY.gather();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_default()
}
