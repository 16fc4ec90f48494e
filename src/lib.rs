//! Ledger-backed asset registry.
//!
//! * [`asset`] — the stored record and the demo seed data.
//! * [`ledger`] — the ordered key-value store the registry runs on, plus an
//!   in-memory implementation with JSON snapshots.
//! * [`contracts`] — the registry handler: request parsing, dispatch and the
//!   five registry functions.

pub mod asset;
pub mod contracts;
pub mod ledger;

pub use asset::Asset;
pub use contracts::{AssetRegistry, ContractError, Invocation, Request, Response};
pub use ledger::{LedgerError, LedgerStore, MemoryLedger};
