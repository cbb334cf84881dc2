use clap::{Args, Subcommand};

use crate::components::StoreArgs;

/// Inspect or reset the ingestion progress of a shard
#[derive(Args, Debug)]
pub(crate) struct CheckpointCommand {
    #[command(flatten)]
    pub(crate) store: StoreArgs,

    #[command(subcommand)]
    pub(crate) subcommands: CheckpointCommands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum CheckpointCommands {
    Read(Read),
    Delete(Delete),
}

#[derive(Args, Debug)]
pub(crate) struct Read {
    /// Defaults to the configured shard
    #[arg(long)]
    pub(crate) shard: Option<u8>,
}

/// The next run of the shard starts from its start block again
#[derive(Args, Debug)]
pub(crate) struct Delete {
    #[arg(long)]
    pub(crate) shard: u8,
}
