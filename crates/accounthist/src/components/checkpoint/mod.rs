use std::error::Error;
use std::path::Path;

use accounthist_core::FacetFactory;
use accounthist_storage::checkpoint::{delete_shard_checkpoint, get_shard_checkpoint};
use tracing::info;

use self::commands::{CheckpointCommand, CheckpointCommands};
use super::{load_config, open_store};

pub(crate) mod commands;

pub(crate) async fn handle_command(
    home: &Path,
    CheckpointCommand { store, subcommands }: CheckpointCommand,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(home, &store)?;
    let store = open_store(&config)?;
    let factory = FacetFactory::new(config.mode);

    match subcommands {
        CheckpointCommands::Read(cmd) => {
            let shard = cmd.shard.unwrap_or(config.shard_num);
            let key = factory.checkpoint_key(shard);

            match get_shard_checkpoint(&*store, &key).await? {
                Some(checkpoint) => println!(
                    "{} shard {shard}: initial start block {}, target stop block {}, last written block {} ({})",
                    config.mode,
                    checkpoint.initial_start_block,
                    checkpoint.target_stop_block,
                    checkpoint.last_written_block_num,
                    checkpoint.last_written_block_id,
                ),
                None => println!("{} shard {shard}: no checkpoint", config.mode),
            }
        }
        CheckpointCommands::Delete(cmd) => {
            let key = factory.checkpoint_key(cmd.shard);
            delete_shard_checkpoint(&*store, &key).await?;

            info!(mode = %config.mode, shard_num = cmd.shard, "Shard checkpoint deleted");
        }
    }

    Ok(())
}
