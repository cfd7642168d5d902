//! Networks the ledger can be deployed to and parameters of the mock
//! price feed used on development chains.

use serde::{Deserialize, Serialize};

/// Decimals reported by the mock ETH/USD feed.
pub const DECIMALS: u8 = 8;

/// Initial answer of the mock ETH/USD feed, 2000 USD.
pub const INITIAL_ANSWER: i128 = 2000_00000000;

/// Networks on which a mock price feed is deployed along with the ledger.
pub const DEVELOPMENT_CHAINS: [&str; 2] = ["hardhat", "localhost"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockFeedConfig {
  pub decimals: u8,
  pub initial_answer: i128,
}

impl Default for MockFeedConfig {
  fn default() -> Self {
    Self {
      decimals: DECIMALS,
      initial_answer: INITIAL_ANSWER,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
  pub name: &'static str,
  pub chain_id: u64,

  /// Address of the live ETH/USD feed, absent on development chains.
  pub eth_usd_price_feed: Option<&'static str>,

  /// Confirmations to wait for after a deployment transaction.
  pub block_confirmations: u64,
}

impl NetworkConfig {
  pub fn is_development(&self) -> bool {
    DEVELOPMENT_CHAINS.contains(&self.name)
  }
}

static NETWORKS: [NetworkConfig; 3] = [
  NetworkConfig {
    name: "hardhat",
    chain_id: 31337,
    eth_usd_price_feed: None,
    block_confirmations: 1,
  },
  NetworkConfig {
    name: "localhost",
    chain_id: 31337,
    eth_usd_price_feed: None,
    block_confirmations: 1,
  },
  NetworkConfig {
    name: "sepolia",
    chain_id: 11155111,
    eth_usd_price_feed: Some("0x694AA1769357215DE4FAC081bf1f309aDC325306"),
    block_confirmations: 6,
  },
];

pub fn networks() -> &'static [NetworkConfig] {
  &NETWORKS
}

pub fn network(name: &str) -> Option<&'static NetworkConfig> {
  NETWORKS.iter().find(|n| n.name == name)
}
