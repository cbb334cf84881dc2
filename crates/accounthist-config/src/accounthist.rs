use std::path::{Path, PathBuf};

use accounthist_core::{ActionFilter, Collection, Name, ShardNum};
use figment::{
    providers::{Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{Config, ConfigError};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct AccounthistConfig {
    /// RocksDB database path
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Tracked timelines, `account` or `account-contract`
    #[serde(default)]
    pub mode: Collection,

    /// Shard being ingested, 0 is the live shard
    #[serde(default)]
    pub shard_num: ShardNum,

    /// Retention window of each facet in a shard
    #[serde(default = "default_max_entries_per_key")]
    pub max_entries_per_key: u64,

    /// Block modulo forcing a flush of the write buffer
    #[serde(default = "default_flush_blocks_interval")]
    pub flush_blocks_interval: u64,

    #[serde(default)]
    pub start_block_num: u64,

    /// 0 means no stop block
    #[serde(default)]
    pub stop_block_num: u64,

    /// Start from `start-block-num` even if the shard has a checkpoint
    #[serde(default)]
    pub ignore_checkpoint_on_launch: bool,

    /// Only record actions with this name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_filter: Option<String>,

    /// Largest page served by the query service
    #[serde(default = "default_max_query_limit")]
    pub max_query_limit: u32,

    /// JSON lines file of blocks fed to the injector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocks_file: Option<PathBuf>,

    /// Count the keys the purger would delete without deleting them
    #[serde(default)]
    pub dry_run: bool,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./accounthist_rocksdb")
}

const fn default_max_entries_per_key() -> u64 {
    1000
}

const fn default_flush_blocks_interval() -> u64 {
    1000
}

const fn default_max_query_limit() -> u32 {
    1000
}

impl Default for AccounthistConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            mode: Collection::default(),
            shard_num: 0,
            max_entries_per_key: default_max_entries_per_key(),
            flush_blocks_interval: default_flush_blocks_interval(),
            start_block_num: 0,
            stop_block_num: 0,
            ignore_checkpoint_on_launch: false,
            action_filter: None,
            max_query_limit: default_max_query_limit(),
            blocks_file: None,
            dry_run: false,
        }
    }
}

impl AccounthistConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flush_blocks_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "flush-blocks-interval",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.max_query_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "max-query-limit",
                reason: "must be greater than 0".to_string(),
            });
        }

        self.action_filter()?;

        Ok(())
    }

    /// Configured action filter, `None` keeps the default filter of the mode
    pub fn action_filter(&self) -> Result<Option<ActionFilter>, ConfigError> {
        self.action_filter
            .as_deref()
            .map(|name| {
                name.parse::<Name>()
                    .map(ActionFilter::ActionName)
                    .map_err(|error| ConfigError::Invalid {
                        field: "action-filter",
                        reason: error.to_string(),
                    })
            })
            .transpose()
    }
}

impl Config for AccounthistConfig {
    type Output = AccounthistConfig;

    fn load_from_file(figment: Figment, home: &Path) -> Figment {
        let home = home.join("config.toml");

        let accounthist = Figment::new()
            .merge(Toml::file(home).nested())
            .select("accounthist");

        figment.merge(accounthist)
    }

    fn load_context(figment: Figment) -> Result<Self::Output, figment::Error> {
        figment.extract()
    }

    fn profile() -> String {
        "accounthist".to_string()
    }
}
