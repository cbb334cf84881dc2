use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use accounthist_config::{AccounthistConfig, Config};
use accounthist_core::{Collection, Facet, Name};
use accounthist_storage::{RocksDBStore, SharedStore};
use clap::Args;
use serde::Serialize;
use tracing::debug;

pub(crate) mod account;
pub(crate) mod checkpoint;
pub(crate) mod purge;
pub(crate) mod run;

/// Store location shared by every command, overriding the config file
#[derive(Args, Debug, Clone, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct StoreArgs {
    /// RocksDB database path
    #[arg(long, env = "ACCOUNTHIST_DB_PATH")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) db_path: Option<PathBuf>,

    /// Tracked timelines, `account` or `account-contract`
    #[arg(long, env = "ACCOUNTHIST_MODE")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) mode: Option<Collection>,
}

/// Layer the command line over `<home>/config.toml` and validate the result
pub(crate) fn load_config<S: Serialize>(
    home: &Path,
    overrides: S,
) -> Result<AccounthistConfig, Box<dyn Error>> {
    let config = AccounthistConfig::load(home, Some(overrides))?;
    config.validate()?;

    debug!(?config, "Configuration loaded");

    Ok(config)
}

pub(crate) fn open_store(config: &AccounthistConfig) -> Result<SharedStore, Box<dyn Error>> {
    Ok(Arc::new(RocksDBStore::open(&config.db_path)?))
}

/// Facet of an account, or of an account and a contract when one is given
pub(crate) fn parse_facet(account: &str, contract: Option<&str>) -> Result<Facet, Box<dyn Error>> {
    let account: Name = account.parse()?;

    Ok(match contract {
        Some(contract) => Facet::AccountContract {
            account,
            contract: contract.parse()?,
        },
        None => Facet::Account(account),
    })
}
