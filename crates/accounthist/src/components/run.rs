use std::error::Error;
use std::future::IntoFuture;
use std::path::{Path, PathBuf};

use accounthist_core::FacetFactory;
use accounthist_injector::{Injector, JsonLinesBlockSource};
use accounthist_metrics::gather_metrics;
use clap::Args;
use serde::Serialize;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{load_config, open_store, StoreArgs};

#[derive(Args, Debug, Serialize)]
#[command(about = "Ingest a stream of irreversible blocks into one shard")]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Run {
    #[command(flatten)]
    #[serde(flatten)]
    pub(crate) store: StoreArgs,

    /// Shard being ingested, 0 is the live shard
    #[arg(long, env = "ACCOUNTHIST_SHARD_NUM")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) shard_num: Option<u8>,

    /// Retention window of each facet in the shard
    #[arg(long, env = "ACCOUNTHIST_MAX_ENTRIES_PER_KEY")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) max_entries_per_key: Option<u64>,

    /// Block modulo forcing a flush of the write buffer
    #[arg(long, env = "ACCOUNTHIST_FLUSH_BLOCKS_INTERVAL")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) flush_blocks_interval: Option<u64>,

    #[arg(long, env = "ACCOUNTHIST_START_BLOCK_NUM")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) start_block_num: Option<u64>,

    /// Block at which ingestion stops, excluded
    #[arg(long, env = "ACCOUNTHIST_STOP_BLOCK_NUM")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) stop_block_num: Option<u64>,

    /// Start from `--start-block-num` even if the shard has a checkpoint
    #[arg(long)]
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub(crate) ignore_checkpoint_on_launch: bool,

    /// Only record actions with this name
    #[arg(long, env = "ACCOUNTHIST_ACTION_FILTER")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) action_filter: Option<String>,

    /// JSON lines file of irreversible blocks
    #[arg(long, env = "ACCOUNTHIST_BLOCKS_FILE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) blocks_file: Option<PathBuf>,
}

pub(crate) async fn handle_command(home: &Path, cmd: Run) -> Result<(), Box<dyn Error>> {
    let config = load_config(home, &cmd)?;

    let blocks_file = config
        .blocks_file
        .clone()
        .ok_or("no blocks file given, set `--blocks-file` or `blocks-file`")?;

    let mut factory = FacetFactory::new(config.mode);
    if let Some(filter) = config.action_filter()? {
        factory = factory.with_action_filter(filter);
    }

    info!(
        mode = %config.mode,
        shard_num = config.shard_num,
        db_path = %config.db_path.display(),
        blocks_file = %blocks_file.display(),
        max_entries_per_key = config.max_entries_per_key,
        "Starting account history injector"
    );

    let shutdown = CancellationToken::new();
    let injector = Injector::builder()
        .with_store(open_store(&config)?)
        .with_block_source(JsonLinesBlockSource::new(blocks_file))
        .with_facet_factory(factory)
        .with_shard_num(config.shard_num)
        .with_max_entries(config.max_entries_per_key)
        .with_flush_blocks_interval(config.flush_blocks_interval)
        .with_start_block_num(config.start_block_num)
        .with_stop_block_num(config.stop_block_num)
        .with_ignore_checkpoint_on_launch(config.ignore_checkpoint_on_launch)
        .with_shutdown(shutdown.clone())
        .build()?;

    let mut handle = tokio::spawn(injector.into_future());

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received ctrl_c, shutting down injector...");
            shutdown.cancel();
            handle.await??;
        }
        result = &mut handle => {
            result??;
        }
    }

    debug!("Final metrics:\n{}", gather_metrics());
    info!("Injector stopped");

    Ok(())
}
