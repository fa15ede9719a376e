use std::{fmt::Display, str::FromStr};

use alloy::primitives::{hex, keccak256, TxHash, B256};
use reqwest::Url;

use crate::{address::Address, escrow::EscrowParties};

pub const DEVELOPMENT_RPC_URL: &str = "http://127.0.0.1:7545";

#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Network {
    /// Local Ganache node
    Development,
    Custom(Url),
}

impl Network {
    pub fn rpc_url(&self) -> eyre::Result<Url> {
        match self {
            Network::Development => Ok(DEVELOPMENT_RPC_URL.parse()?),
            Network::Custom(url) => Ok(url.clone()),
        }
    }

    /// Directory name deployment records of this network are kept under.
    /// Custom endpoints are keyed by host plus a short hash of the full URL,
    /// which keeps path and query segments (API keys) out of the name.
    pub fn record_dir_name(&self) -> String {
        match self {
            Network::Development => "development".to_string(),
            Network::Custom(url) => {
                let host = url.host_str().unwrap_or("custom");
                let digest = keccak256(url.as_str());
                format!("{host}-{}", hex::encode(&digest[..4]))
            }
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Development => write!(f, "development"),
            Network::Custom(url) => write!(f, "{}", url),
        }
    }
}

impl TryFrom<String> for Network {
    type Error = eyre::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "development" | "ganache" => Ok(Network::Development),
            _ => Ok(Network::Custom(value.parse()?)),
        }
    }
}

impl FromStr for Network {
    type Err = eyre::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.to_string().try_into()
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ListMode {
    All,
    Latest,
}

impl TryFrom<String> for ListMode {
    type Error = eyre::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "all" => Ok(ListMode::All),
            "latest" => Ok(ListMode::Latest),
            _ => Err(eyre::eyre!("invalid list mode")),
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeploymentRecord {
    pub name: String,
    pub date: String,
    pub operation: String,
    pub version: String,
    pub tx_hash: Option<TxHash>,
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
    pub gas_used: Option<u64>,
    pub bytecode_hash: B256,
    pub deployer: Address,
    pub supplier: Address,
    pub distributor: Address,
    pub carrier: Address,
    // This field is not required, so you can edit in your <contract>.json file to add comment for cooperations
    #[serde(default)]
    pub comment: Option<String>,
}

impl DeploymentRecord {
    pub fn parties(&self) -> eyre::Result<EscrowParties> {
        Ok(EscrowParties::new(
            self.supplier,
            self.distributor,
            self.carrier,
        )?)
    }

    pub fn deployed_address(&self) -> eyre::Result<Address> {
        self.contract_address
            .ok_or(eyre::eyre!("record of {} has no contract address", self.name))
    }
}
