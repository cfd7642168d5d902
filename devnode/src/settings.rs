use {
  crate::storage::{NodeState, Registry},
  clap::{Parser, Subcommand},
  std::path::PathBuf,
};

/// FundMe Local Devnode
///
/// A single process development chain with the funding ledger and a
/// mock ETH/USD price feed, for local use in dev, CI and test scenarios.
#[derive(Debug, Parser)]
pub struct SystemSettings {
  /// Directory of the on-disk chain state.
  ///
  /// When omitted the state lives in memory and is discarded when the
  /// command completes.
  #[clap(long, short, value_name = "PATH")]
  data_dir: Option<PathBuf>,

  /// Network to deploy to and interact with
  #[clap(long, short, default_value = "hardhat", value_name = "NAME")]
  network: String,

  #[clap(subcommand)]
  pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
  /// List development accounts and their balances
  Accounts,

  /// Deploy the mock price feed and the funding ledger
  Deploy {
    /// Account that deploys and owns the ledger
    #[clap(long, default_value = "deployer", value_name = "ACCOUNT")]
    from: String,
  },

  /// Contribute to the ledger
  Fund {
    /// Contributing account, a development account name or an address
    #[clap(long, default_value = "deployer", value_name = "ACCOUNT")]
    from: String,

    /// Contribution in ether
    #[clap(long, default_value = "0.1", value_name = "ETHER")]
    value: String,
  },

  /// Withdraw all contributions to the owner
  Withdraw {
    #[clap(long, default_value = "deployer", value_name = "ACCOUNT")]
    from: String,

    /// Copy the funder list to memory before resetting it
    #[clap(long)]
    cheaper: bool,
  },

  /// Show the ledger state
  Status,

  /// Report a new answer on the mock price feed
  SetPrice {
    /// Price with the feed's decimals, 2000_00000000 is 2000 USD
    #[clap(long, value_name = "INT", allow_negative_numbers = true)]
    answer: i128,
  },

  /// Five accounts fund the ledger, then the owner withdraws
  Demo,
}

impl SystemSettings {
  /// Opens the chain state, either an in-memory ephemeral storage if no
  /// data directory is provided or a persistent on-disk store otherwise.
  pub fn storage(&self) -> Result<(NodeState, Registry), sled::Error> {
    match &self.data_dir {
      Some(path) => {
        let db = sled::open(path)?;
        Ok((NodeState::on_disk(&db)?, Registry::on_disk(&db)?))
      }
      None => Ok((NodeState::ephemeral(), Registry::ephemeral())),
    }
  }

  pub fn network(&self) -> &str {
    &self.network
  }
}
