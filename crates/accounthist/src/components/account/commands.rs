use clap::{Args, Subcommand};

use crate::components::StoreArgs;

/// Inspect the history stored for facets
#[derive(Args, Debug)]
pub(crate) struct AccountCommand {
    #[command(flatten)]
    pub(crate) store: StoreArgs,

    #[command(subcommand)]
    pub(crate) subcommands: AccountCommands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum AccountCommands {
    Read(Read),
    Scan(Scan),
    Actions(Actions),
}

/// Every shard holding rows for a facet with its newest sequence data
#[derive(Args, Debug)]
pub(crate) struct Read {
    pub(crate) account: String,

    /// Read the account-contract facet of this contract
    #[arg(long)]
    pub(crate) contract: Option<String>,
}

/// Facets of the configured mode, in key order
#[derive(Args, Debug)]
pub(crate) struct Scan {
    /// 0 lists every facet
    #[arg(long, default_value_t = 100)]
    pub(crate) limit: usize,
}

/// Actions of a facet, newest first, as JSON lines
#[derive(Args, Debug)]
pub(crate) struct Actions {
    pub(crate) account: String,

    #[arg(long)]
    pub(crate) contract: Option<String>,

    /// 0 returns the configured max query limit
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub(crate) limit: i64,

    /// Resume after the row this cursor was returned with
    #[arg(long)]
    pub(crate) cursor: Option<String>,

    /// Only read this shard
    #[arg(long)]
    pub(crate) shard: Option<u8>,
}
