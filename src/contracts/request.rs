use crate::asset::Asset;
use crate::contracts::ContractError;

pub const INIT_LEDGER: &str = "initLedger";
pub const PUT_ASSET: &str = "putAsset";
pub const QUERY_ASSET: &str = "queryAsset";
pub const QUERY_ALL_ASSET: &str = "queryAllAsset";
pub const CHANGE_ASSET_GRADE: &str = "changeAssetGrade";

/// Function name plus positional arguments, as delivered by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub function: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<F, I, A>(function: F, args: I) -> Self
    where
        F: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        Self {
            function: function.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryAsset {
    pub key: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutAsset {
    pub key: String,
    pub asset: Asset,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeAssetGrade {
    pub key: String,
    pub approval_status: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    InitLedger,
    PutAsset(PutAsset),
    QueryAsset(QueryAsset),
    QueryAllAsset,
    ChangeAssetGrade(ChangeAssetGrade),
}

impl Request {
    pub fn function(&self) -> &'static str {
        match self {
            Request::InitLedger => INIT_LEDGER,
            Request::PutAsset(_) => PUT_ASSET,
            Request::QueryAsset(_) => QUERY_ASSET,
            Request::QueryAllAsset => QUERY_ALL_ASSET,
            Request::ChangeAssetGrade(_) => CHANGE_ASSET_GRADE,
        }
    }
}

impl TryFrom<Invocation> for Request {
    type Error = ContractError;

    fn try_from(invocation: Invocation) -> Result<Self, Self::Error> {
        let Invocation { function, args } = invocation;
        match function.as_str() {
            INIT_LEDGER => {
                let [] = expect_args::<0>(INIT_LEDGER, args)?;
                Ok(Request::InitLedger)
            }
            PUT_ASSET => {
                let [
                    key,
                    handler,
                    raw,
                    title,
                    version,
                    release_time,
                    author,
                    approval_status,
                    approver,
                ] = expect_args::<9>(PUT_ASSET, args)?;
                Ok(Request::PutAsset(PutAsset {
                    key,
                    asset: Asset {
                        handler,
                        raw,
                        title,
                        version,
                        release_time,
                        author,
                        approval_status,
                        approver,
                    },
                }))
            }
            QUERY_ASSET => {
                let [key] = expect_args::<1>(QUERY_ASSET, args)?;
                Ok(Request::QueryAsset(QueryAsset { key }))
            }
            QUERY_ALL_ASSET => {
                let [] = expect_args::<0>(QUERY_ALL_ASSET, args)?;
                Ok(Request::QueryAllAsset)
            }
            CHANGE_ASSET_GRADE => {
                let [key, approval_status] = expect_args::<2>(CHANGE_ASSET_GRADE, args)?;
                Ok(Request::ChangeAssetGrade(ChangeAssetGrade {
                    key,
                    approval_status,
                }))
            }
            _ => Err(ContractError::UnknownFunction { function }),
        }
    }
}

fn expect_args<const N: usize>(
    function: &'static str,
    args: Vec<String>,
) -> Result<[String; N], ContractError> {
    let actual = args.len();
    args.try_into()
        .map_err(|_| ContractError::ArgumentCount {
            function,
            expected: N,
            actual,
        })
}
