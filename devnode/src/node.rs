use {
  crate::storage::{DeploymentRecord, NodeState, Registry},
  anyhow::{anyhow, bail},
  fundme::{
    config::{self, MockFeedConfig, NetworkConfig},
    deploy::{deploy, Deployment},
    Error,
    FundingLedger,
    MockV3Aggregator,
    PriceFeed,
  },
  fundme_primitives::{ether, Address, Amount, Call},
  fundme_vm::{Chain, Receipt},
  std::sync::Arc,
  tracing::{info, warn},
};

/// Development accounts created at genesis.
pub const ACCOUNTS: [&str; 6] = [
  "deployer",
  "account-1",
  "account-2",
  "account-3",
  "account-4",
  "account-5",
];

/// Ether every development account starts with.
pub const GENESIS_BALANCE: u64 = 10_000;

/// Resolves a development account name or a base58 address.
pub fn resolve_account(account: &str) -> anyhow::Result<Address> {
  if ACCOUNTS.contains(&account) {
    return Ok(Address::named(account));
  }
  account.parse().map_err(|e| {
    anyhow!("'{account}' is neither an account name nor an address: {e}")
  })
}

/// Ledger state as seen by its readers.
#[derive(Debug)]
pub struct Status {
  pub ledger: Address,
  pub owner: Address,
  pub feed: Address,
  /// Latest normalized price, `None` while the feed is unusable.
  pub price: Option<Amount>,
  pub version: u64,
  pub balance: Amount,
  pub funders: Vec<(Address, Amount)>,
}

pub struct Node {
  network: &'static NetworkConfig,
  chain: Chain<NodeState>,
  registry: Registry,
}

impl Node {
  pub fn new(
    network: &str,
    state: NodeState,
    mut registry: Registry,
  ) -> anyhow::Result<Self> {
    let network = config::network(network)
      .ok_or_else(|| anyhow!("unknown network '{network}'"))?;
    let mut chain = Chain::new(state);

    if !registry.genesis_done()? {
      for name in ACCOUNTS {
        chain.mint(&Address::named(name), ether(GENESIS_BALANCE))?;
      }
      registry.mark_genesis()?;
      info!("genesis: funded {} development accounts", ACCOUNTS.len());
    }

    Ok(Self {
      network,
      chain,
      registry,
    })
  }

  pub fn accounts(&self) -> anyhow::Result<Vec<(&'static str, Address, Amount)>> {
    ACCOUNTS
      .iter()
      .map(|name| -> anyhow::Result<_> {
        let address = Address::named(name);
        Ok((*name, address, self.chain.balance_of(&address)?))
      })
      .collect()
  }

  /// Deploys a fresh mock feed and ledger, replacing any earlier
  /// deployment on this network.
  pub fn deploy(&mut self, deployer: Address) -> anyhow::Result<FundingLedger> {
    let Deployment { feed, ledger, .. } = deploy(
      &mut self.chain,
      deployer,
      self.network.name,
      MockFeedConfig::default(),
    )?;
    self.save(&ledger, &feed)?;
    info!(
      "waiting for {} block confirmation(s) on {}",
      self.network.block_confirmations, self.network.name
    );
    Ok(ledger)
  }

  pub fn fund(
    &mut self,
    funder: Address,
    value: Amount,
  ) -> anyhow::Result<Receipt<()>> {
    let (ledger, _) = self.deployment()?;
    let receipt = self.chain.execute(
      ledger.address(),
      Call::from(funder).with_value(value),
      |env| ledger.fund(env),
    );
    Ok(log_rejection("fund", receipt)?)
  }

  pub fn withdraw(
    &mut self,
    caller: Address,
    cheaper: bool,
  ) -> anyhow::Result<Receipt<Amount>> {
    let (ledger, _) = self.deployment()?;
    let receipt =
      self
        .chain
        .execute(ledger.address(), Call::from(caller), |env| {
          if cheaper {
            ledger.cheaper_withdraw(env)
          } else {
            ledger.withdraw(env)
          }
        });
    Ok(log_rejection("withdraw", receipt)?)
  }

  pub fn set_price(&mut self, answer: i128) -> anyhow::Result<()> {
    let (ledger, feed) = self.deployment()?;
    feed.update_answer(answer);
    self.save(&ledger, &feed)?;
    info!("mock price feed {} now answers {answer}", feed.address());
    Ok(())
  }

  pub fn status(&mut self) -> anyhow::Result<Status> {
    let (ledger, _) = self.deployment()?;
    let funders = self.chain.query(ledger.address(), |env| {
      (0..ledger.get_funder_count(env)?)
        .map(|index| -> Result<_, Error> {
          let funder = ledger.get_funder(env, index)?;
          let amount = ledger.get_address_to_amount_funded(env, &funder)?;
          Ok((funder, amount))
        })
        .collect::<Result<Vec<_>, Error>>()
    })?;

    Ok(Status {
      ledger: ledger.address(),
      owner: ledger.get_owner(),
      feed: ledger.get_price_feed(),
      price: ledger.oracle().get_latest_price().ok(),
      version: ledger.get_version(),
      balance: self.chain.balance_of(&ledger.address())?,
      funders,
    })
  }

  pub fn balance_of(&self, address: &Address) -> anyhow::Result<Amount> {
    Ok(self.chain.balance_of(address)?)
  }

  /// The ledger deployed on this network, deployed by the default
  /// deployer account if there is none yet.
  fn deployment(
    &mut self,
  ) -> anyhow::Result<(FundingLedger, Arc<MockV3Aggregator>)> {
    match self.registry.deployment(self.network.name)? {
      Some(record) => {
        let feed = Arc::new(MockV3Aggregator::restore(record.feed, record.mock));
        let ledger = FundingLedger::at(record.ledger, record.owner, feed.clone());
        Ok((ledger, feed))
      }
      None => {
        if !self.network.is_development() {
          bail!("no ledger deployed on network '{}'", self.network.name);
        }
        info!("no ledger deployed on '{}' yet, deploying", self.network.name);
        self.deploy(Address::named(ACCOUNTS[0]))?;
        self.deployment()
      }
    }
  }

  fn save(
    &mut self,
    ledger: &FundingLedger,
    feed: &MockV3Aggregator,
  ) -> anyhow::Result<()> {
    self.registry.save_deployment(self.network.name, &DeploymentRecord {
      ledger: ledger.address(),
      owner: ledger.get_owner(),
      feed: feed.address(),
      mock: feed.snapshot(),
    })
  }
}

fn log_rejection<T>(
  operation: &str,
  result: Result<Receipt<T>, Error>,
) -> Result<Receipt<T>, Error> {
  if let Err(e) = &result {
    warn!("{operation} rejected: {e}");
  }
  result
}
