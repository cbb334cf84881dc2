use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};

use crate::errors::CursorError;
use crate::facet::Facet;
use crate::{Ordinal, ShardNum};

pub const CURSOR_MAGIC: u32 = 4374;
pub const CURSOR_VERSION: u32 = 0;

/// Position of a row returned by the query service, handed back to resume a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    pub magic: u32,
    pub version: u32,
    /// Prefix bytes of the facet the cursor was issued for
    pub key: Vec<u8>,
    pub shard_num: ShardNum,
    pub sequence_number: Ordinal,
}

impl Cursor {
    pub fn new(facet: &Facet, shard_num: ShardNum, sequence_number: Ordinal) -> Self {
        Self {
            magic: CURSOR_MAGIC,
            version: CURSOR_VERSION,
            key: facet.bytes(),
            shard_num,
            sequence_number,
        }
    }

    /// Opaque, url-safe form handed to clients
    pub fn to_opaque(&self) -> Result<String, CursorError> {
        let bytes = bincode::serialize(self)?;
        Ok(Base64UrlUnpadded::encode_string(&bytes))
    }

    pub fn from_opaque(opaque: &str) -> Result<Self, CursorError> {
        let bytes = Base64UrlUnpadded::decode_vec(opaque)?;
        let cursor: Cursor = bincode::deserialize(&bytes)?;

        if cursor.magic != CURSOR_MAGIC {
            return Err(CursorError::InvalidMagic(cursor.magic));
        }

        if cursor.version != CURSOR_VERSION {
            return Err(CursorError::UnsupportedVersion(cursor.version));
        }

        Ok(cursor)
    }

    /// Decode a cursor and make sure it was issued for `facet`.
    pub fn from_opaque_for(opaque: &str, facet: &Facet) -> Result<Self, CursorError> {
        let cursor = Self::from_opaque(opaque)?;
        if cursor.key != facet.bytes() {
            return Err(CursorError::KeyMismatch);
        }

        Ok(cursor)
    }
}
