#![allow(dead_code)]

use {
  fundme::{
    config::MockFeedConfig,
    deploy::{deploy, Deployment},
    Error,
    FundingLedger,
    MockV3Aggregator,
  },
  fundme_primitives::{ether, Address, Amount, Call},
  fundme_vm::{Chain, InMemoryStateStore, Receipt},
  rand::{rngs::StdRng, SeedableRng},
  std::sync::Arc,
};

pub mod ledger_ops;

/// Native value every named account starts with.
pub const GENESIS_BALANCE: u64 = 10_000;

/// The two interchangeable withdrawal algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Withdrawal {
  Naive,
  Cheaper,
}

pub const BOTH: [Withdrawal; 2] = [Withdrawal::Naive, Withdrawal::Cheaper];

/// Deterministic rng for randomized tests.
///
/// The seed is printed so a failing run can be replayed by setting
/// `FUNDME_TEST_SEED`.
pub fn seeded_rng() -> StdRng {
  let seed = std::env::var("FUNDME_TEST_SEED")
    .ok()
    .and_then(|seed| seed.parse().ok())
    .unwrap_or_else(rand::random::<u64>);
  println!("rng seed: {seed}");
  StdRng::seed_from_u64(seed)
}

/// A development chain with a deployed ledger, a mock feed priced at
/// 2000 USD and a set of funded accounts.
pub struct Fixture {
  pub chain: Chain<InMemoryStateStore>,
  pub ledger: FundingLedger,
  pub feed: Arc<MockV3Aggregator>,
  pub owner: Address,
}

impl Fixture {
  pub fn new() -> anyhow::Result<Self> {
    let mut chain = Chain::new(InMemoryStateStore::default());
    let owner = Address::named("deployer");
    let Deployment { feed, ledger, .. } =
      deploy(&mut chain, owner, "hardhat", MockFeedConfig::default())?;

    chain.mint(&owner, ether(GENESIS_BALANCE))?;
    for account in accounts(10) {
      chain.mint(&account, ether(GENESIS_BALANCE))?;
    }

    Ok(Self {
      chain,
      ledger,
      feed,
      owner,
    })
  }

  pub fn fund(
    &mut self,
    funder: Address,
    value: Amount,
  ) -> Result<Receipt<()>, Error> {
    let ledger = &self.ledger;
    self.chain.execute(
      ledger.address(),
      Call::from(funder).with_value(value),
      |env| ledger.fund(env),
    )
  }

  pub fn withdraw(
    &mut self,
    caller: Address,
    algorithm: Withdrawal,
  ) -> Result<Receipt<Amount>, Error> {
    let ledger = &self.ledger;
    self
      .chain
      .execute(ledger.address(), Call::from(caller), |env| match algorithm {
        Withdrawal::Naive => ledger.withdraw(env),
        Withdrawal::Cheaper => ledger.cheaper_withdraw(env),
      })
  }

  pub fn amount_funded(&self, funder: &Address) -> Result<Amount, Error> {
    self.chain.query(self.ledger.address(), |env| {
      self.ledger.get_address_to_amount_funded(env, funder)
    })
  }

  pub fn funder(&self, index: u64) -> Result<Address, Error> {
    self
      .chain
      .query(self.ledger.address(), |env| self.ledger.get_funder(env, index))
  }

  pub fn funder_count(&self) -> Result<u64, Error> {
    self
      .chain
      .query(self.ledger.address(), |env| self.ledger.get_funder_count(env))
  }

  pub fn balance_of(&self, address: &Address) -> Result<Amount, Error> {
    Ok(self.chain.balance_of(address)?)
  }

  pub fn ledger_balance(&self) -> Result<Amount, Error> {
    self.balance_of(&self.ledger.address())
  }
}

/// Named development accounts "account-1" .. "account-n".
pub fn accounts(n: usize) -> Vec<Address> {
  (1..=n)
    .map(|i| Address::named(&format!("account-{i}")))
    .collect()
}
