use {
  crate::{Error, PriceFeed, PriceOracle},
  fundme_primitives::{Address, Amount, U256},
  fundme_vm::{Chain, Env, Key, State},
  std::sync::Arc,
  tracing::{debug, info},
};

/// Minimum contribution, 50 USD with 18 decimals.
pub const MINIMUM_USD: Amount = U256([13_106_511_852_580_896_768, 2, 0, 0]);

/// A crowdfunding ledger that accepts contributions worth at least
/// [`MINIMUM_USD`] and lets its owner withdraw everything collected.
///
/// The ledger itself holds only immutable configuration: its address, the
/// owner fixed at deployment and the price oracle. Contributions, the list
/// of funders and the collected balance live in chain state under the
/// ledger address and are accessed through the [`Env`] of each call.
#[derive(Debug, Clone)]
pub struct FundingLedger {
  address: Address,
  owner: Address,
  oracle: PriceOracle,
}

impl FundingLedger {
  /// Deploys a new ledger owned by `deployer` that prices contributions
  /// through `feed`.
  pub fn deploy<S: State>(
    chain: &mut Chain<S>,
    deployer: Address,
    feed: Arc<dyn PriceFeed>,
  ) -> Result<Self, Error> {
    let address = chain.create_address(&deployer)?;
    let ledger = Self::at(address, deployer, feed);
    info!(
      "deployed funding ledger at {address}, owner {deployer}, price feed {}",
      ledger.get_price_feed()
    );
    Ok(ledger)
  }

  /// Attaches to a ledger that was deployed earlier.
  pub fn at(address: Address, owner: Address, feed: Arc<dyn PriceFeed>) -> Self {
    Self {
      address,
      owner,
      oracle: PriceOracle::new(feed),
    }
  }

  pub fn address(&self) -> Address {
    self.address
  }

  pub fn oracle(&self) -> &PriceOracle {
    &self.oracle
  }

  /// Records the value attached to the call as a contribution of the
  /// caller.
  ///
  /// Fails with [`Error::InsufficientContribution`] when the value is
  /// worth less than [`MINIMUM_USD`].
  pub fn fund<S: State + ?Sized>(&self, env: &mut Env<'_, S>) -> Result<(), Error> {
    let value = env.value();
    let converted = self.oracle.get_conversion_rate(value)?;
    if converted < MINIMUM_USD {
      return Err(Error::InsufficientContribution {
        converted,
        minimum: MINIMUM_USD,
      });
    }

    let funder = env.caller();
    let amount_key = self.amount_key(&funder);
    let funded = env
      .load::<Amount>(&amount_key)?
      .unwrap_or_default()
      .checked_add(value)
      .ok_or(Error::ArithmeticOverflow)?;
    env.store(amount_key, &funded)?;

    let len_key = self.funders_len_key();
    let len = env.load::<u64>(&len_key)?.unwrap_or_default();
    let funder_key = self.funder_key(len);
    env.store(funder_key, &funder)?;
    env.store(len_key, &(len + 1))?;

    debug!("{funder} funded {value} wei worth {converted} USD-wei");
    Ok(())
  }

  /// Plain value transfers to the ledger count as contributions.
  pub fn receive<S: State + ?Sized>(
    &self,
    env: &mut Env<'_, S>,
  ) -> Result<(), Error> {
    self.fund(env)
  }

  /// Clears all contributions and sends the whole balance to the owner.
  ///
  /// Reads the list length from storage before every iteration, so it
  /// costs `2N + 1` storage reads for `N` funders.
  pub fn withdraw<S: State + ?Sized>(
    &self,
    env: &mut Env<'_, S>,
  ) -> Result<Amount, Error> {
    self.only_owner(env)?;

    let mut index = 0;
    loop {
      let len = self.funder_count(env)?;
      if index >= len {
        break;
      }
      let funder = self.funder_at(env, index, len)?;
      env.remove(&self.amount_key(&funder));
      index += 1;
    }

    self.reset_and_pay_out(env)
  }

  /// Same effects as [`FundingLedger::withdraw`], but copies the funder
  /// list into memory first, which brings the storage reads down to
  /// `N + 1`.
  pub fn cheaper_withdraw<S: State + ?Sized>(
    &self,
    env: &mut Env<'_, S>,
  ) -> Result<Amount, Error> {
    self.only_owner(env)?;

    let len = self.funder_count(env)?;
    let funders = (0..len)
      .map(|index| self.funder_at(env, index, len))
      .collect::<Result<Vec<_>, _>>()?;

    for funder in funders {
      env.remove(&self.amount_key(&funder));
    }

    self.reset_and_pay_out(env)
  }

  /// Address of the price feed used to value contributions.
  pub fn get_price_feed(&self) -> Address {
    self.oracle.feed_address()
  }

  pub fn get_owner(&self) -> Address {
    self.owner
  }

  pub fn get_version(&self) -> u64 {
    self.oracle.get_version()
  }

  /// Funder recorded by the `index`-th contribution since the last
  /// withdrawal.
  pub fn get_funder<S: State + ?Sized>(
    &self,
    env: &Env<'_, S>,
    index: u64,
  ) -> Result<Address, Error> {
    let len = self.funder_count(env)?;
    if index >= len {
      return Err(Error::IndexOutOfRange { index, len });
    }
    self.funder_at(env, index, len)
  }

  pub fn get_funder_count<S: State + ?Sized>(
    &self,
    env: &Env<'_, S>,
  ) -> Result<u64, Error> {
    self.funder_count(env)
  }

  /// Total contributed by `funder` since the last withdrawal.
  pub fn get_address_to_amount_funded<S: State + ?Sized>(
    &self,
    env: &Env<'_, S>,
    funder: &Address,
  ) -> Result<Amount, Error> {
    Ok(
      env
        .load::<Amount>(&self.amount_key(funder))?
        .unwrap_or_default(),
    )
  }

  fn only_owner<S: State + ?Sized>(&self, env: &Env<'_, S>) -> Result<(), Error> {
    let caller = env.caller();
    if caller != self.owner {
      return Err(Error::NotOwner { caller });
    }
    Ok(())
  }

  /// Empties the funder list with a single write and transfers the whole
  /// ledger balance to the caller. The transfer is the last step.
  fn reset_and_pay_out<S: State + ?Sized>(
    &self,
    env: &mut Env<'_, S>,
  ) -> Result<Amount, Error> {
    env.remove(&self.funders_len_key());

    let owner = env.caller();
    let balance = env.self_balance()?;
    env
      .transfer(owner, balance)
      .map_err(Error::TransferFailed)?;

    info!("{owner} withdrew {balance} wei from ledger {}", self.address);
    Ok(balance)
  }

  fn funder_count<S: State + ?Sized>(&self, env: &Env<'_, S>) -> Result<u64, Error> {
    Ok(env.load::<u64>(&self.funders_len_key())?.unwrap_or_default())
  }

  fn funder_at<S: State + ?Sized>(
    &self,
    env: &Env<'_, S>,
    index: u64,
    len: u64,
  ) -> Result<Address, Error> {
    env
      .load::<Address>(&self.funder_key(index))?
      .ok_or(Error::IndexOutOfRange { index, len })
  }

  fn funders_len_key(&self) -> Key {
    Key::derive(&self.address, &[b"funders", b"len"])
  }

  fn funder_key(&self, index: u64) -> Key {
    Key::derive(&self.address, &[b"funders", &index.to_le_bytes()])
  }

  fn amount_key(&self, funder: &Address) -> Key {
    Key::derive(&self.address, &[b"amounts", &funder.to_bytes()])
  }
}
