//! The asset registry contract.
//!
//! [`AssetRegistry`] is stateless: each call receives the ledger to act on,
//! parses the invocation into a typed [`Request`], performs at most one
//! ledger round trip (or one range scan) and answers with a [`Response`].

mod request;

pub use request::{
    ChangeAssetGrade, Invocation, PutAsset, QueryAsset, Request, CHANGE_ASSET_GRADE, INIT_LEDGER,
    PUT_ASSET, QUERY_ALL_ASSET, QUERY_ASSET,
};

use serde::Serialize;
use serde_json::value::RawValue;

use crate::asset::{seed_assets, seed_key, Asset};
use crate::ledger::{KeyValue, LedgerError, LedgerStore};

#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Incorrect number of arguments for {function}. Expecting {expected}, got {actual}")]
    ArgumentCount {
        function: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Invalid Smart Contract function name.")]
    UnknownFunction { function: String },
    #[error("asset {key} does not exist")]
    NotFound { key: String },
    #[error("cannot decode record stored under {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("cannot encode response: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// Outcome of one invocation: a payload (possibly empty) or a message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Response {
    Success(Vec<u8>),
    Error(String),
}

impl Response {
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            Response::Success(payload) => Some(payload),
            Response::Error(_) => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Response::Success(_) => None,
            Response::Error(message) => Some(message),
        }
    }
}

impl From<Result<Vec<u8>, ContractError>> for Response {
    fn from(result: Result<Vec<u8>, ContractError>) -> Self {
        match result {
            Ok(payload) => Response::Success(payload),
            Err(err) => Response::Error(err.to_string()),
        }
    }
}

/// One element of the `queryAllAsset` array. The record is inlined verbatim.
#[derive(Serialize)]
struct QueryResult {
    #[serde(rename = "Key")]
    key: String,
    #[serde(rename = "Record")]
    record: Box<RawValue>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AssetRegistry;

impl AssetRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Instantiation hook. Seeding is a separate, explicit `initLedger` call.
    pub fn init(&self) -> Response {
        Response::Success(Vec::new())
    }

    pub fn invoke<S>(&self, ledger: &mut S, invocation: Invocation) -> Response
    where
        S: LedgerStore + ?Sized,
    {
        let function = invocation.function.clone();
        let result = Request::try_from(invocation).and_then(|request| self.execute(ledger, request));
        match &result {
            Ok(payload) => {
                tracing::debug!(%function, payload_len = payload.len(), "invocation succeeded")
            }
            Err(err) => tracing::debug!(%function, error = %err, "invocation rejected"),
        }
        result.into()
    }

    pub fn execute<S>(&self, ledger: &mut S, request: Request) -> Result<Vec<u8>, ContractError>
    where
        S: LedgerStore + ?Sized,
    {
        match request {
            Request::InitLedger => self.init_ledger(ledger).map(|()| Vec::new()),
            Request::PutAsset(put) => self.put_asset(ledger, put).map(|()| Vec::new()),
            Request::QueryAsset(query) => self.query_asset(&*ledger, &query),
            Request::QueryAllAsset => self.query_all_asset(&*ledger),
            Request::ChangeAssetGrade(change) => {
                self.change_asset_grade(ledger, change).map(|()| Vec::new())
            }
        }
    }

    /// Raw bytes under the key. A missing key answers with an empty payload.
    pub fn query_asset<S>(&self, ledger: &S, query: &QueryAsset) -> Result<Vec<u8>, ContractError>
    where
        S: LedgerStore + ?Sized,
    {
        Ok(ledger.get_state(&query.key)?.unwrap_or_default())
    }

    pub fn init_ledger<S>(&self, ledger: &mut S) -> Result<(), ContractError>
    where
        S: LedgerStore + ?Sized,
    {
        for (index, asset) in seed_assets().iter().enumerate() {
            let key = seed_key(index);
            ledger.put_state(&key, asset.to_json().map_err(ContractError::Encode)?)?;
            tracing::info!(%key, title = %asset.title, "seeded asset");
        }
        Ok(())
    }

    pub fn put_asset<S>(&self, ledger: &mut S, put: PutAsset) -> Result<(), ContractError>
    where
        S: LedgerStore + ?Sized,
    {
        let bytes = put.asset.to_json().map_err(ContractError::Encode)?;
        ledger.put_state(&put.key, bytes)?;
        tracing::info!(key = %put.key, "asset stored");
        Ok(())
    }

    /// JSON array of `{"Key": .., "Record": ..}` over the whole key range.
    pub fn query_all_asset<S>(&self, ledger: &S) -> Result<Vec<u8>, ContractError>
    where
        S: LedgerStore + ?Sized,
    {
        let mut results = Vec::new();
        for entry in ledger.get_state_by_range("", "")? {
            let KeyValue { key, value } = entry?;
            let record = serde_json::from_slice::<Box<RawValue>>(&value)
                .map_err(|source| ContractError::Decode {
                    key: key.clone(),
                    source,
                })?;
            results.push(QueryResult { key, record });
        }
        let payload = serde_json::to_vec(&results).map_err(ContractError::Encode)?;
        tracing::debug!(count = results.len(), "enumerated assets");
        Ok(payload)
    }

    pub fn change_asset_grade<S>(
        &self,
        ledger: &mut S,
        change: ChangeAssetGrade,
    ) -> Result<(), ContractError>
    where
        S: LedgerStore + ?Sized,
    {
        let ChangeAssetGrade {
            key,
            approval_status,
        } = change;
        let bytes = match ledger.get_state(&key)? {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Err(ContractError::NotFound { key }),
        };
        let mut asset = match Asset::from_json(&bytes) {
            Ok(asset) => asset,
            Err(source) => return Err(ContractError::Decode { key, source }),
        };
        let previous = std::mem::replace(&mut asset.approval_status, approval_status);
        ledger.put_state(&key, asset.to_json().map_err(ContractError::Encode)?)?;
        tracing::info!(
            %key,
            from = %previous,
            to = %asset.approval_status,
            "approval status changed"
        );
        Ok(())
    }
}
