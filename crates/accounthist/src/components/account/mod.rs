use std::error::Error;
use std::path::Path;

use accounthist_api::{ActionResponse, ActionsRequest, QueryService};
use accounthist_core::row::ActionRow;
use accounthist_core::{Cursor, ShardNum};
use accounthist_storage::scan::{facet_summary, scan_facets};
use futures::TryStreamExt;
use serde::Serialize;
use tracing::debug;

use self::commands::{AccountCommand, AccountCommands, Actions};
use super::{load_config, open_store, parse_facet};

pub(crate) mod commands;

#[derive(Serialize)]
struct ActionLine<'a> {
    cursor: &'a str,
    shard_num: ShardNum,
    ordinal: u64,
    action: &'a ActionRow,
}

impl<'a> From<&'a ActionResponse> for ActionLine<'a> {
    fn from(response: &'a ActionResponse) -> Self {
        Self {
            cursor: &response.cursor,
            shard_num: response.shard_num,
            ordinal: response.ordinal,
            action: &response.action,
        }
    }
}

pub(crate) async fn handle_command(
    home: &Path,
    AccountCommand { store, subcommands }: AccountCommand,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(home, &store)?;
    let store = open_store(&config)?;

    match subcommands {
        AccountCommands::Read(cmd) => {
            let facet = parse_facet(&cmd.account, cmd.contract.as_deref())?;
            let summary = facet_summary(&*store, &facet).await?;

            if summary.shards.is_empty() {
                println!("{facet}: no actions");
                return Ok(());
            }

            for shard in &summary.shards {
                println!(
                    "{facet} shard {}: current ordinal {}, last global sequence {}, last deleted ordinal {}",
                    shard.shard,
                    shard.sequence.current_ordinal,
                    shard.sequence.last_global_seq,
                    shard.sequence.last_deleted_ordinal,
                );
            }
            println!("{facet}: {} actions", summary.total_actions());
        }
        AccountCommands::Scan(cmd) => {
            let heads = scan_facets(&*store, config.mode, cmd.limit).await?;
            debug!(facets = heads.len(), "Facets scanned");

            for head in heads {
                println!(
                    "{} shard {}: current ordinal {}",
                    head.facet, head.shard, head.sequence.current_ordinal
                );
            }
        }
        AccountCommands::Actions(cmd) => {
            let service = QueryService::new(store, config.max_query_limit);
            print_actions(&service, cmd).await?;
        }
    }

    Ok(())
}

async fn print_actions(service: &QueryService, cmd: Actions) -> Result<(), Box<dyn Error>> {
    let facet = parse_facet(&cmd.account, cmd.contract.as_deref())?;
    let mut request = ActionsRequest::new(facet).with_limit(cmd.limit);
    if let Some(cursor) = cmd.cursor {
        request = request.with_cursor(cursor);
    }

    let actions: Vec<ActionResponse> = match cmd.shard {
        Some(shard) => {
            service
                .get_shard_actions(&request, shard)?
                .try_collect()
                .await?
        }
        None => {
            let page = service.get_actions_page(&request).await?;
            if page.has_next_page {
                if let Some(cursor) = page.end_cursor() {
                    let decoded = Cursor::from_opaque(cursor)?;
                    eprintln!(
                        "more actions after shard {} ordinal {}, resume with --cursor {cursor}",
                        decoded.shard_num, decoded.sequence_number
                    );
                }
            }
            page.actions
        }
    };

    for action in &actions {
        println!("{}", serde_json::to_string(&ActionLine::from(action))?);
    }

    Ok(())
}
