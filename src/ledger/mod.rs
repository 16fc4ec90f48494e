//! Ordered key-value ledger consumed by the asset registry.
//!
//! The registry never owns durable state. Every invocation receives a
//! [`LedgerStore`] and talks to it through three calls: point read, point
//! write and range scan. [`MemoryLedger`] is the in-process implementation
//! used by the command line front end and the tests; it can be persisted as a
//! [`LedgerSnapshot`] whose entries are committed to by a SHA-256 state root.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::ops::Bound;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub type Key = String;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("key must not be an empty string")]
    EmptyKey,
    #[error("ledger i/o failure: {0}")]
    Io(#[from] io::Error),
    #[error("malformed ledger snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
    #[error("invalid hex in ledger snapshot: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("snapshot state root {recorded} does not match entries (computed {computed})")]
    RootMismatch { recorded: String, computed: String },
    #[error("{0}")]
    Backend(String),
}

/// One entry yielded by a range scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Key,
    pub value: Vec<u8>,
}

/// Lazy cursor over a key range. Dropping it releases the scan.
pub type RangeCursor<'a> = Box<dyn Iterator<Item = Result<KeyValue, LedgerError>> + 'a>;

/// State access offered by the hosting ledger.
pub trait LedgerStore {
    /// Returns the value stored under `key`, or `None` when the key is absent.
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError>;

    /// Scans keys in `[start, end)` in lexicographic order. An empty bound is
    /// open on that side, so `("", "")` walks the whole ledger.
    fn get_state_by_range(&self, start: &str, end: &str) -> Result<RangeCursor<'_>, LedgerError>;
}

#[derive(Default)]
pub struct MemoryLedger {
    height: u64,
    entries: BTreeMap<Key, Vec<u8>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes committed so far.
    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state_root(&self) -> [u8; 32] {
        compute_state_root(&self.entries)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            meta: SnapshotMetadata {
                height: self.height,
                state_root: hex::encode(self.state_root()),
            },
            entries: self
                .entries
                .iter()
                .map(|(key, value)| SnapshotEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self, LedgerError> {
        let mut entries = BTreeMap::new();
        for entry in snapshot.entries {
            if entry.key.is_empty() {
                return Err(LedgerError::EmptyKey);
            }
            entries.insert(entry.key, entry.value);
        }
        let recorded = hex::decode(&snapshot.meta.state_root)?;
        let computed = compute_state_root(&entries);
        if recorded.as_slice() != computed.as_slice() {
            return Err(LedgerError::RootMismatch {
                recorded: snapshot.meta.state_root,
                computed: hex::encode(computed),
            });
        }
        Ok(Self {
            height: snapshot.meta.height,
            entries,
        })
    }

    /// Loads a ledger from a snapshot file. A missing file is an empty ledger.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no snapshot on disk, starting empty");
                return Ok(Self::new());
            }
            Err(err) => return Err(err.into()),
        };
        let snapshot: LedgerSnapshot = serde_json::from_slice(&bytes)?;
        let ledger = Self::from_snapshot(snapshot)?;
        tracing::debug!(
            path = %path.display(),
            height = ledger.height,
            entries = ledger.entries.len(),
            "loaded ledger snapshot"
        );
        Ok(ledger)
    }

    pub fn store(&self, path: &Path) -> Result<(), LedgerError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_vec_pretty(&self.snapshot())?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl LedgerStore for MemoryLedger {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::EmptyKey);
        }
        self.entries.insert(key.to_string(), value);
        self.height += 1;
        Ok(())
    }

    fn get_state_by_range(&self, start: &str, end: &str) -> Result<RangeCursor<'_>, LedgerError> {
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start)
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end)
        };
        // BTreeMap::range panics on an inverted range.
        if !start.is_empty() && !end.is_empty() && start > end {
            return Ok(Box::new(std::iter::empty()));
        }
        let cursor = self
            .entries
            .range::<str, _>((lower, upper))
            .map(|(key, value)| {
                Ok(KeyValue {
                    key: key.clone(),
                    value: value.clone(),
                })
            });
        Ok(Box::new(cursor))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotMetadata {
    pub height: u64,
    pub state_root: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub key: Key,
    #[serde(with = "crate::ledger::serde_hex")]
    pub value: Vec<u8>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub meta: SnapshotMetadata,
    pub entries: Vec<SnapshotEntry>,
}

fn compute_state_root(entries: &BTreeMap<Key, Vec<u8>>) -> [u8; 32] {
    let leaves: Vec<[u8; 32]> = entries
        .iter()
        .map(|(key, value)| {
            let mut hasher = Sha256::new();
            hasher.update(b"entry");
            hasher.update((key.len() as u64).to_le_bytes());
            hasher.update(key.as_bytes());
            hasher.update(value);
            hasher.finalize().into()
        })
        .collect();
    build_merkle(leaves)
}

fn build_merkle(mut leaves: Vec<[u8; 32]>) -> [u8; 32] {
    if leaves.is_empty() {
        return Sha256::digest(b"asset-ledger-empty").into();
    }
    while leaves.len() > 1 {
        let mut next = Vec::with_capacity((leaves.len() + 1) / 2);
        for chunk in leaves.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(b"node");
            hasher.update(chunk[0]);
            // odd leaf pairs with itself
            hasher.update(chunk.get(1).unwrap_or(&chunk[0]));
            next.push(hasher.finalize().into());
        }
        leaves = next;
    }
    leaves[0]
}

pub(crate) mod serde_hex {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(&encoded).map_err(D::Error::custom)
    }
}
