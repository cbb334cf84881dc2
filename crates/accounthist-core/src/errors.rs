use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NameError {
    #[error("Name {0:?} is longer than 13 characters")]
    TooLong(String),

    #[error("Name {name:?} contains invalid character {character:?}")]
    InvalidCharacter { name: String, character: char },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid key length for collection {collection:#04x}: expected {expected}, got {actual}")]
    InvalidLength {
        collection: u8,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown collection prefix {0:#04x}")]
    UnknownCollection(u8),

    #[error("Key belongs to collection {actual:#04x}, expected {expected:#04x}")]
    CollectionMismatch { expected: u8, actual: u8 },

    #[error("Empty key")]
    Empty,
}

#[derive(Error, Debug)]
pub enum RowError {
    #[error("Row value is too short: {0} bytes")]
    TooShort(usize),

    #[error("Unable to decode action row: {0}")]
    Decode(#[from] Box<bincode::ErrorKind>),

    #[error("Action row has no receipt")]
    MissingReceipt,
}

#[derive(Error, Debug)]
pub enum CursorError {
    #[error("Unable to unpack cursor: {0}")]
    Base64(#[from] base64ct::Error),

    #[error("Invalid or malformed cursor: {0}")]
    Malformed(#[from] Box<bincode::ErrorKind>),

    #[error("Invalid magic number in cursor, is this a cursor obtained through this same service?")]
    InvalidMagic(u32),

    #[error("Unsupported cursor version {0}")]
    UnsupportedVersion(u32),

    #[error("Cursor does not belong to the requested key")]
    KeyMismatch,
}

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Unable to decode shard checkpoint: {0}")]
    Decode(#[from] Box<bincode::ErrorKind>),
}
