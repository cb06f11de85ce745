//! Selection of the chain a test run targets.
//!
//! A [`NetworkRegistry`] holds exactly one current [`NetworkDescriptor`]. It starts
//! on mainnet and is only ever replaced wholesale by [`NetworkRegistry::set_network`].

use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

pub const LOCALHOST: &str = "localhost";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    pub network_name: String,
    pub network_id: u64,
    pub is_testnet: bool,
}

impl NetworkDescriptor {
    fn new(network_name: &str, network_id: u64, is_testnet: bool) -> Self {
        Self {
            network_name: network_name.to_string(),
            network_id,
            is_testnet,
        }
    }
}

impl fmt::Display for NetworkDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (chain id {}{})",
            self.network_name,
            self.network_id,
            if self.is_testnet { ", testnet" } else { "" }
        )
    }
}

/// Built-in networks, addressable by key.
pub fn preset_networks() -> [NetworkDescriptor; 3] {
    [
        NetworkDescriptor::new("mainnet", 1, false),
        NetworkDescriptor::new("goerli", 5, true),
        NetworkDescriptor::new("sepolia", 11155111, true),
    ]
}

pub fn preset_network(key: &str) -> Option<NetworkDescriptor> {
    preset_networks()
        .into_iter()
        .find(|network| network.network_name == key)
}

/// Name of a well-known chain id, `"unknown"` otherwise.
pub fn chain_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "mainnet",
        5 => "goerli",
        11155111 => "sepolia",
        _ => "unknown",
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal chain id.
pub fn parse_chain_id(value: &str) -> Result<u64> {
    let trimmed = value.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| Error::InvalidChainId(value.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkSelection {
    /// One of the [`preset_networks`] by name.
    Preset(String),
    /// A locally running node, queried for its live chain id.
    Localhost,
    Custom {
        network_name: String,
        chain_id: String,
        is_testnet: bool,
    },
}

impl FromStr for NetworkSelection {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == LOCALHOST {
            Ok(Self::Localhost)
        } else {
            Ok(Self::Preset(s.to_string()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRegistry {
    current: NetworkDescriptor,
    local_rpc_url: String,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::new(crate::config::LOCAL_RPC_URL)
    }
}

impl NetworkRegistry {
    pub fn new(local_rpc_url: &str) -> Self {
        Self {
            current: NetworkDescriptor::new("mainnet", 1, false),
            local_rpc_url: local_rpc_url.to_string(),
        }
    }

    /// Current network, by value.
    pub fn network(&self) -> NetworkDescriptor {
        tracing::debug!("Current network data: {}", self.current);
        self.current.clone()
    }

    /// Replaces the current network.
    ///
    /// On any error, including [`Error::UnknownNetwork`] for an unrecognized preset
    /// key, the previously selected network stays current.
    pub async fn set_network(&mut self, selection: NetworkSelection) -> Result<()> {
        tracing::debug!("Setting network to {:?}", selection);

        let next = match selection {
            NetworkSelection::Preset(key) => {
                preset_network(&key).ok_or_else(|| Error::UnknownNetwork(key))?
            }
            NetworkSelection::Localhost => {
                let chain_id = query_chain_id(&self.local_rpc_url).await?;
                NetworkDescriptor::new(chain_name(chain_id), chain_id, true)
            }
            NetworkSelection::Custom {
                network_name,
                chain_id,
                is_testnet,
            } => NetworkDescriptor {
                network_name,
                network_id: parse_chain_id(&chain_id)?,
                is_testnet,
            },
        };

        self.current = next;
        Ok(())
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<serde_json::Value>,
}

/// Calls `eth_chainId` on the given JSON-RPC endpoint.
pub async fn query_chain_id(url: &str) -> Result<u64> {
    let invalid = |reason: String| Error::InvalidRpcResponse {
        url: url.to_string(),
        reason,
    };

    let response = Client::new()
        .post(url)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_chainId",
            "params": [],
        }))
        .send()
        .await
        .map_err(|source| Error::NetworkUnreachable {
            url: url.to_string(),
            source,
        })?;

    let body: RpcResponse = response.json().await.map_err(|e| invalid(e.to_string()))?;

    if let Some(error) = body.error {
        return Err(invalid(error.to_string()));
    }
    let result = body
        .result
        .ok_or_else(|| invalid("missing result".to_string()))?;
    parse_chain_id(&result).map_err(|_| invalid(format!("chain id '{result}' is not a number")))
}
