use serde::{Deserialize, Serialize};

/// Registry record as stored in the ledger.
///
/// Field names on the wire are fixed; existing ledgers hold records in this
/// exact shape. Values are free-form strings and are never validated.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Asset {
    #[serde(rename = "AssetHandler")]
    pub handler: String,
    #[serde(rename = "AssetRaw")]
    pub raw: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "V_No")]
    pub version: String,
    #[serde(rename = "ReleaseTime")]
    pub release_time: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "ApprovalStatus")]
    pub approval_status: String,
    #[serde(rename = "Approver")]
    pub approver: String,
}

impl Asset {
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

pub const SEED_KEY_PREFIX: &str = "Asset";

/// Ledger key of the seed record at `index`.
pub fn seed_key(index: usize) -> String {
    format!("{SEED_KEY_PREFIX}{index}")
}

/// Demo records written by `initLedger`.
pub fn seed_assets() -> Vec<Asset> {
    vec![Asset {
        handler: "LMN".into(),
        raw: "PPP".into(),
        title: "Test1".into(),
        version: "1".into(),
        release_time: "11/05/2019".into(),
        author: "Joses".into(),
        approval_status: "Pending approval".into(),
        approver: "Dr.Yue".into(),
    }]
}
