use std::error::Error;
use std::path::Path;

use accounthist_purger::{Purger, DEFAULT_PURGE_BATCH_SIZE};
use clap::Args;
use serde::Serialize;
use tracing::info;

use super::{load_config, open_store, StoreArgs};

#[derive(Args, Debug, Serialize)]
#[command(about = "Delete the rows of every facet beyond its max entries across shards")]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Purge {
    #[command(flatten)]
    #[serde(flatten)]
    pub(crate) store: StoreArgs,

    /// Number of actions kept per facet across all shards
    #[arg(long, env = "ACCOUNTHIST_MAX_ENTRIES_PER_KEY")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_entries_per_key: Option<u64>,

    /// Count the keys to delete without deleting them
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub(crate) dry_run: bool,

    /// Number of keys deleted at once
    #[arg(long, default_value_t = DEFAULT_PURGE_BATCH_SIZE)]
    #[serde(skip)]
    pub(crate) batch_size: usize,
}

pub(crate) async fn handle_command(home: &Path, cmd: Purge) -> Result<(), Box<dyn Error>> {
    let config = load_config(home, &cmd)?;
    let store = open_store(&config)?;

    let report = Purger::new(store, config.mode)
        .with_dry_run(config.dry_run)
        .with_batch_size(cmd.batch_size)
        .purge(config.max_entries_per_key, |facet, above_shard, seen| {
            info!(
                facet = %facet,
                above_shard,
                seen_actions = seen,
                "Purging facet above shard"
            );
        })
        .await?;

    println!(
        "{} facets scanned, {} facets purged, {} keys {}",
        report.facets_scanned,
        report.facets_purged,
        report.keys_deleted,
        if config.dry_run {
            "to delete"
        } else {
            "deleted"
        }
    );

    Ok(())
}
