use std::pin::Pin;

use accounthist_core::keyer::prefix_next;
use accounthist_core::row::{decode_row_value, ActionRow};
use accounthist_core::{Cursor, Facet, Ordinal, ShardNum};
use accounthist_storage::{with_timeout, KeyValue, SharedStore};
use futures::{Stream, StreamExt};
use tracing::{debug, info};

use crate::errors::ApiError;

pub type ActionStream = Pin<Box<dyn Stream<Item = Result<ActionResponse, ApiError>> + Send>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionsRequest {
    pub facet: Facet,
    /// Negative values are rejected, 0 means the service maximum
    pub limit: i64,
    pub cursor: Option<String>,
}

impl ActionsRequest {
    pub fn new(facet: Facet) -> Self {
        Self {
            facet,
            limit: 0,
            cursor: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionResponse {
    /// Opaque cursor resuming right after this row
    pub cursor: String,
    pub shard_num: ShardNum,
    pub ordinal: Ordinal,
    pub action: ActionRow,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionsPage {
    pub actions: Vec<ActionResponse>,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl ActionsPage {
    /// Cursor of the last row of the page
    pub fn end_cursor(&self) -> Option<&str> {
        self.actions.last().map(|action| action.cursor.as_str())
    }
}

/// Read side of the history: streams the rows of one facet, newest first.
///
/// Rows are read straight from the backing store, so a running injector is only observed once it
/// flushed.
#[derive(Clone)]
pub struct QueryService {
    store: SharedStore,
    max_limit: u32,
}

impl QueryService {
    pub fn new(store: SharedStore, max_limit: u32) -> Self {
        Self { store, max_limit }
    }

    pub fn max_limit(&self) -> u32 {
        self.max_limit
    }

    /// Number of rows served for a requested `limit`.
    pub fn effective_limit(&self, limit: i64) -> Result<usize, ApiError> {
        if limit < 0 {
            return Err(ApiError::InvalidArgument(format!(
                "negative limit {limit} is not valid"
            )));
        }

        let max_limit = i64::from(self.max_limit);
        if limit == 0 || limit > max_limit {
            return Ok(self.max_limit as usize);
        }

        Ok(limit as usize)
    }

    /// Stream the whole history of a facet, every shard in order, resuming after the cursor
    /// when one is given.
    pub fn get_actions(&self, request: &ActionsRequest) -> Result<ActionStream, ApiError> {
        let limit = self.effective_limit(request.limit)?;
        let (start_key, end_key) = history_bounds(request)?;

        Ok(self.scan(&request.facet, start_key, end_key, limit))
    }

    /// Same as [`QueryService::get_actions`] restricted to one shard.
    ///
    /// A cursor issued for another shard is rejected.
    pub fn get_shard_actions(
        &self,
        request: &ActionsRequest,
        shard: ShardNum,
    ) -> Result<ActionStream, ApiError> {
        let limit = self.effective_limit(request.limit)?;
        let shard_prefix = request.facet.shard_prefix(shard);
        let end_key = prefix_next(&shard_prefix);

        let start_key = match decode_cursor(request)? {
            Some(cursor) if cursor.shard_num != shard => {
                return Err(ApiError::InvalidArgument(format!(
                    "cursor belongs to shard {} instead of shard {shard}",
                    cursor.shard_num
                )));
            }
            Some(cursor) => resume_key(&request.facet, &cursor),
            None => shard_prefix,
        };

        Ok(self.scan(&request.facet, start_key, end_key, limit))
    }

    /// Collect one page of history.
    ///
    /// One row past the limit is read to know whether a next page exists.
    pub async fn get_actions_page(
        &self,
        request: &ActionsRequest,
    ) -> Result<ActionsPage, ApiError> {
        let limit = self.effective_limit(request.limit)?;
        let (start_key, end_key) = history_bounds(request)?;

        let mut stream = self.scan(&request.facet, start_key, end_key, limit + 1);
        let mut actions = Vec::with_capacity(limit);
        let mut has_next_page = false;

        while let Some(action) = stream.next().await {
            let action = action?;
            if actions.len() >= limit {
                has_next_page = true;
                break;
            }
            actions.push(action);
        }

        Ok(ActionsPage {
            actions,
            has_next_page,
            has_previous_page: request.cursor.is_some(),
        })
    }

    fn scan(
        &self,
        facet: &Facet,
        start_key: Vec<u8>,
        end_key: Vec<u8>,
        limit: usize,
    ) -> ActionStream {
        info!(
            facet = %facet,
            start_key = hex::encode(&start_key),
            end_key = hex::encode(&end_key),
            limit,
            "Scanning actions"
        );

        let store = self.store.clone();

        Box::pin(async_stream::stream! {
            let rows = match with_timeout(store.scan(&start_key, &end_key, limit)).await {
                Ok(rows) => rows,
                Err(error) => {
                    yield Err(ApiError::from(error));
                    return;
                }
            };

            debug!(rows = rows.len(), "Actions scanned");

            for row in rows {
                let response = decode_action(&row);
                let failed = response.is_err();

                yield response;

                if failed {
                    return;
                }
            }
        })
    }
}

fn decode_cursor(request: &ActionsRequest) -> Result<Option<Cursor>, ApiError> {
    request
        .cursor
        .as_deref()
        .map(|opaque| Cursor::from_opaque_for(opaque, &request.facet))
        .transpose()
        .map_err(ApiError::from)
}

/// First key strictly after the row the cursor points to.
///
/// Ordinal 0 is never written, its key sorts after every row of the shard.
fn resume_key(facet: &Facet, cursor: &Cursor) -> Vec<u8> {
    facet
        .row(cursor.shard_num, cursor.sequence_number.saturating_sub(1))
        .into_vec()
}

fn history_bounds(request: &ActionsRequest) -> Result<(Vec<u8>, Vec<u8>), ApiError> {
    let facet = &request.facet;
    let start_key = match decode_cursor(request)? {
        Some(cursor) => resume_key(facet, &cursor),
        None => facet.shard_prefix(0),
    };

    Ok((start_key, prefix_next(&facet.bytes())))
}

fn decode_action(row: &KeyValue) -> Result<ActionResponse, ApiError> {
    let (facet, shard_num, ordinal) = Facet::decode_row(&row.key)?;
    let (action, _) = decode_row_value(&row.value)?;
    let cursor = Cursor::new(&facet, shard_num, ordinal).to_opaque()?;

    Ok(ActionResponse {
        cursor,
        shard_num,
        ordinal,
        action,
    })
}
