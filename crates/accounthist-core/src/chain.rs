//! Decoded chain model delivered by the block source.
//!
//! The ingestion pipeline only needs a narrow view of a block: its identity, its time, the
//! transaction traces it carries and, for each action, who received it, who authorized it and
//! the chain-wide global sequence assigned by its receipt.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::NameError;

const NAME_CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";
const NAME_MAX_LEN: usize = 13;

/// A chain account or action name, packed into 64 bits.
///
/// Up to 12 characters of `.12345a-z` are packed 5 bits each from the most significant bit,
/// a 13th character only has 4 bits available and is restricted to `.12345a-j`.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(pub u64);

impl Name {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn to_be_bytes(&self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }
}

fn char_to_symbol(c: char) -> Option<u64> {
    match c {
        'a'..='z' => Some((c as u64 - 'a' as u64) + 6),
        '1'..='5' => Some((c as u64 - '1' as u64) + 1),
        '.' => Some(0),
        _ => None,
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.chars().count() > NAME_MAX_LEN {
            return Err(NameError::TooLong(s.to_string()));
        }

        let mut value = 0u64;
        for (i, c) in s.chars().enumerate() {
            let symbol = char_to_symbol(c).ok_or_else(|| NameError::InvalidCharacter {
                name: s.to_string(),
                character: c,
            })?;

            if i < NAME_MAX_LEN - 1 {
                value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
            } else {
                if symbol > 0x0f {
                    return Err(NameError::InvalidCharacter {
                        name: s.to_string(),
                        character: c,
                    });
                }
                value |= symbol & 0x0f;
            }
        }

        Ok(Self(value))
    }
}

impl TryFrom<&str> for Name {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = [b'.'; NAME_MAX_LEN];
        let mut tmp = self.0;
        for i in 0..NAME_MAX_LEN {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            out[NAME_MAX_LEN - 1 - i] = NAME_CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }

        let end = out
            .iter()
            .rposition(|c| *c != b'.')
            .map(|pos| pos + 1)
            .unwrap_or(0);

        // Every byte of the charmap is ascii
        f.write_str(&String::from_utf8_lossy(&out[..end]))
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({self})")
    }
}

impl From<u64> for Name {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u64(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let value = String::deserialize(deserializer)?;
            value.parse().map_err(de::Error::custom)
        } else {
            u64::deserialize(deserializer).map(Self)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub receiver: Name,
    pub global_sequence: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Contract the action is addressed to
    pub account: Name,
    pub name: Name,
    #[serde(default)]
    pub authorization: Vec<PermissionLevel>,
    #[serde(default, with = "hex::serde")]
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTrace {
    pub receiver: Name,
    #[serde(default)]
    pub receipt: Option<ActionReceipt>,
    pub action: Action,
    #[serde(default)]
    pub execution_index: u32,
    /// Set by the upstream filtering when the action matched its inclusion rules
    #[serde(default)]
    pub filtering_matched: bool,
}

impl ActionTrace {
    pub fn global_sequence(&self) -> Option<u64> {
        self.receipt.as_ref().map(|receipt| receipt.global_sequence)
    }

    /// Accounts implicated by this action: the receiver followed by every authorization actor,
    /// each listed once in order of first appearance.
    pub fn subjects(&self) -> Vec<Name> {
        let mut subjects = Vec::with_capacity(1 + self.action.authorization.len());
        subjects.push(self.receiver);
        for level in &self.action.authorization {
            if !subjects.contains(&level.actor) {
                subjects.push(level.actor);
            }
        }

        subjects
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionTrace {
    pub id: String,
    #[serde(default)]
    pub reverted: bool,
    #[serde(default)]
    pub action_traces: Vec<ActionTrace>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub number: u64,
    #[serde(default)]
    pub previous_id: String,
    /// Block production time, milliseconds since the unix epoch
    #[serde(default)]
    pub timestamp_ms: u64,
    /// Whether the upstream source already applied its action filtering on this block
    #[serde(default)]
    pub filtering_applied: bool,
    #[serde(default)]
    pub transaction_traces: Vec<TransactionTrace>,
}

impl Block {
    pub fn time(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.timestamp_ms)
    }

    /// Chain level inclusion test for one action of this block.
    pub fn is_action_matched(&self, action: &ActionTrace) -> bool {
        !self.filtering_applied || action.filtering_matched
    }

    /// Time elapsed between the production of this block and `now`, zero when the block is
    /// ahead of the local clock.
    pub fn drift(&self, now: SystemTime) -> Duration {
        now.duration_since(self.time()).unwrap_or_default()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({})", self.number, self.id)
    }
}
