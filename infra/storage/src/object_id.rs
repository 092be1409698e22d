//! Twelve-byte, time-ordered object identifiers.
//!
//! Layout (big-endian where numeric):
//!
//! | bytes  | content                                   |
//! |--------|-------------------------------------------|
//! | 0..4   | Unix timestamp in seconds                 |
//! | 4..9   | random value fixed per generator          |
//! | 9..12  | counter, incremented per id, wraps at 2^24 |
//!
//! Identifiers render as 24 lowercase hex characters. They serve both as the character key
//! supplied by callers and as the generated file name of every stored image.

use crate::error::StorageError;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Size of an [`ObjectId`] in bytes.
pub const OBJECT_ID_LEN: usize = 12;
/// Length of the hex rendering of an [`ObjectId`].
pub const OBJECT_ID_HEX_LEN: usize = OBJECT_ID_LEN * 2;

const COUNTER_MASK: u32 = 0x00FF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; OBJECT_ID_LEN]);

impl ObjectId {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; OBJECT_ID_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; OBJECT_ID_LEN] {
        &self.0
    }

    /// Seconds since the Unix epoch at which the identifier was minted.
    #[must_use]
    pub const fn timestamp(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// Returns `true` iff `s` is exactly 24 hexadecimal digits (either case).
    ///
    /// Syntactic validity says nothing about whether anything is stored under the id.
    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        s.len() == OBJECT_ID_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_valid(s) {
            return Err(StorageError::InvalidIdentifier {
                message: format!("{s} is not a valid character ID").into(),
                context: None,
            });
        }

        let mut bytes = [0u8; OBJECT_ID_LEN];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| StorageError::InvalidIdentifier {
            message: e.to_string().into(),
            context: Some(format!("Decoding {s}").into()),
        })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<&str> for ObjectId {
    type Error = StorageError;

    fn try_from(value: &str) -> Result<Self, StorageError> {
        value.parse()
    }
}

/// Thread-safe [`ObjectId`] source.
///
/// One generator is created when the store connects and shared by every request through the
/// store handle. Two calls on the same generator never collide while fewer than 2^24 ids are
/// minted within one second.
#[derive(Debug)]
pub struct ObjectIdGenerator {
    process_unique: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    /// Seeds the random component and the counter from the operating system RNG.
    ///
    /// # Errors
    /// Returns [`StorageError::Internal`] if the system RNG is unavailable.
    pub fn new() -> Result<Self, StorageError> {
        let mut seed = [0u8; 8];
        getrandom::fill(&mut seed).map_err(|e| StorageError::Internal {
            message: e.to_string().into(),
            context: Some("Failed to seed object id generator".into()),
        })?;

        let mut process_unique = [0u8; 5];
        process_unique.copy_from_slice(&seed[..5]);
        let counter = u32::from_be_bytes([0, seed[5], seed[6], seed[7]]);

        Ok(Self::with_seed(process_unique, counter))
    }

    /// Builds a generator with a fixed random component and counter start.
    #[must_use]
    pub const fn with_seed(process_unique: [u8; 5], counter: u32) -> Self {
        Self { process_unique, counter: AtomicU32::new(counter & COUNTER_MASK) }
    }

    /// Mints the next identifier. Never fails.
    pub fn generate(&self) -> ObjectId {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX));
        self.generate_at(secs)
    }

    fn generate_at(&self, secs: u32) -> ObjectId {
        let count = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; OBJECT_ID_LEN];
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process_unique);
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..]);
        ObjectId(bytes)
    }
}
