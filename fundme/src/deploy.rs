//! Deployment of the ledger together with the price feed it depends on.

use {
  crate::{
    config::{self, MockFeedConfig, NetworkConfig},
    FundingLedger,
    MockV3Aggregator,
  },
  fundme_primitives::Address,
  fundme_vm::{Chain, State},
  std::sync::Arc,
  thiserror::Error,
  tracing::info,
};

#[derive(Debug, Error)]
pub enum DeployError {
  #[error("Unknown network '{0}'")]
  UnknownNetwork(String),

  #[error(
    "Network '{network}' prices contributions through the live feed at \
     {feed}, which is not reachable from a local chain"
  )]
  LiveFeedUnreachable {
    network: &'static str,
    feed: &'static str,
  },

  #[error("Network '{0}' has no price feed configured")]
  MissingPriceFeed(&'static str),

  #[error("Environment error: {0}")]
  Vm(#[from] fundme_vm::Error),

  #[error("Ledger error: {0}")]
  Ledger(#[from] crate::Error),
}

/// Everything deployed to a development chain.
#[derive(Debug, Clone)]
pub struct Deployment {
  pub network: &'static NetworkConfig,
  pub feed: Arc<MockV3Aggregator>,
  pub ledger: FundingLedger,
}

/// Deploys a mock ETH/USD feed owned by `deployer`.
pub fn deploy_mocks<S: State>(
  chain: &mut Chain<S>,
  deployer: Address,
  config: MockFeedConfig,
) -> Result<Arc<MockV3Aggregator>, DeployError> {
  let address = chain.create_address(&deployer)?;
  let feed = MockV3Aggregator::new(
    address,
    config.decimals,
    config.initial_answer,
  );
  info!(
    "deployed mock price feed at {address} with {} decimals, answer {}",
    config.decimals, config.initial_answer
  );
  Ok(Arc::new(feed))
}

/// Deploys the ledger to the network named `network`.
///
/// Development chains get a fresh mock feed first. Live networks need a
/// configured feed address, but those feeds cannot be reached from a
/// local chain, so the deployment is refused.
pub fn deploy<S: State>(
  chain: &mut Chain<S>,
  deployer: Address,
  network: &str,
  mock: MockFeedConfig,
) -> Result<Deployment, DeployError> {
  let network = config::network(network)
    .ok_or_else(|| DeployError::UnknownNetwork(network.to_owned()))?;

  if !network.is_development() {
    let feed = network
      .eth_usd_price_feed
      .ok_or(DeployError::MissingPriceFeed(network.name))?;
    return Err(DeployError::LiveFeedUnreachable {
      network: network.name,
      feed,
    });
  }

  info!("local network '{}' detected, deploying mocks", network.name);
  let feed = deploy_mocks(chain, deployer, mock)?;
  let ledger = FundingLedger::deploy(chain, deployer, feed.clone())?;

  Ok(Deployment {
    network,
    feed,
    ledger,
  })
}
