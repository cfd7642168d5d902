use {
  crate::{Key, State, StateDiff, StateError, Storage, Usage},
  fundme_primitives::{Address, Amount, Call},
  serde::{Deserialize, Serialize},
  std::ops::{Deref, DerefMut},
  thiserror::Error,
  tracing::debug,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("State access error: {0}")]
  State(#[from] StateError),

  #[error("Failed to encode a storage value: {0}")]
  Encode(#[from] rmp_serde::encode::Error),

  #[error("Failed to decode a storage value: {0}")]
  Decode(#[from] rmp_serde::decode::Error),

  #[error(
    "Account {account} holds {balance} wei but {required} wei are required"
  )]
  InsufficientFunds {
    account: Address,
    balance: Amount,
    required: Amount,
  },

  #[error("Account {0} rejected an incoming value transfer")]
  TransferRejected(Address),

  #[error("Balance of account {0} would overflow")]
  BalanceOverflow(Address),
}

/// A movement of native value between two addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
  pub from: Address,
  pub to: Address,
  pub amount: Amount,
}

/// Outcome of a committed call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt<T> {
  /// Value returned by the contract code.
  pub output: T,

  /// Chain height at which the call was committed.
  pub height: u64,

  /// Metered durable storage accesses of the call.
  pub usage: Usage,

  /// All value movements of the call in order, starting with the value
  /// attached to the call when it is non-zero.
  pub transfers: Vec<Transfer>,
}

/// The execution environment handed to contract code for one call.
///
/// It exposes the implicit call context (caller, attached value, own
/// address), metered storage through `Deref` to [`Storage`], and native
/// value transfers out of the contract.
pub struct Env<'a, S: State + ?Sized> {
  call: Call,
  contract: Address,
  storage: Storage<'a, S>,
  transfers: Vec<Transfer>,
}

impl<'a, S: State + ?Sized> Env<'a, S> {
  fn new(base: &'a S, contract: Address, call: Call) -> Self {
    Self {
      call,
      contract,
      storage: Storage::new(base),
      transfers: Vec::new(),
    }
  }

  /// Identity of the account that invoked this call.
  pub fn caller(&self) -> Address {
    self.call.caller
  }

  /// Native value attached to this call. It is already part of the
  /// contract balance by the time contract code runs.
  pub fn value(&self) -> Amount {
    self.call.value
  }

  /// Address of the contract being called.
  pub fn address(&self) -> Address {
    self.contract
  }

  pub fn balance_of(&self, address: &Address) -> Result<Amount, Error> {
    Ok(self.storage.get(&Key::balance(address))?.unwrap_or_default())
  }

  /// Native value currently held by the called contract.
  pub fn self_balance(&self) -> Result<Amount, Error> {
    self.balance_of(&self.contract)
  }

  /// Sends native value from the called contract to `to`.
  pub fn transfer(&mut self, to: Address, amount: Amount) -> Result<(), Error> {
    let from = self.contract;
    self.move_value(from, to, amount)
  }

  fn move_value(
    &mut self,
    from: Address,
    to: Address,
    amount: Amount,
  ) -> Result<(), Error> {
    if self
      .storage
      .get::<bool>(&Key::rejects_transfers(&to))?
      .unwrap_or(false)
    {
      return Err(Error::TransferRejected(to));
    }

    let balance = self.balance_of(&from)?;
    if balance < amount {
      return Err(Error::InsufficientFunds {
        account: from,
        balance,
        required: amount,
      });
    }

    if from != to {
      let credited = self
        .balance_of(&to)?
        .checked_add(amount)
        .ok_or(Error::BalanceOverflow(to))?;
      self.storage.put(Key::balance(&from), &(balance - amount))?;
      self.storage.put(Key::balance(&to), &credited)?;
    }

    self.transfers.push(Transfer { from, to, amount });
    Ok(())
  }

  fn into_parts(self) -> (StateDiff, Usage, Vec<Transfer>) {
    let (diff, usage) = self.storage.into_parts();
    (diff, usage, self.transfers)
  }
}

impl<'a, S: State + ?Sized> Deref for Env<'a, S> {
  type Target = Storage<'a, S>;

  fn deref(&self) -> &Self::Target {
    &self.storage
  }
}

impl<'a, S: State + ?Sized> DerefMut for Env<'a, S> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.storage
  }
}

/// Owns the committed state and serializes all calls against it.
///
/// Every call executes atomically: the value attached to the call,
/// all storage writes and all outgoing transfers are buffered and
/// become visible only if the contract code returns `Ok`. A failed
/// call leaves the committed state exactly as it was.
#[derive(Debug, Default)]
pub struct Chain<S: State> {
  state: S,
}

impl<S: State> Chain<S> {
  pub fn new(state: S) -> Self {
    Self { state }
  }

  /// Number of committed calls so far.
  pub fn height(&self) -> Result<u64, Error> {
    Storage::new(&self.state)
      .get(&Key::height())
      .map(Option::unwrap_or_default)
  }

  pub fn balance_of(&self, address: &Address) -> Result<Amount, Error> {
    Storage::new(&self.state)
      .get(&Key::balance(address))
      .map(Option::unwrap_or_default)
  }

  pub fn nonce_of(&self, address: &Address) -> Result<u64, Error> {
    Storage::new(&self.state)
      .get(&Key::nonce(address))
      .map(Option::unwrap_or_default)
  }

  /// Creates native value out of thin air. Used for genesis allocations
  /// and faucets on development networks.
  pub fn mint(&mut self, to: &Address, amount: Amount) -> Result<(), Error> {
    let balance = self
      .balance_of(to)?
      .checked_add(amount)
      .ok_or(Error::BalanceOverflow(*to))?;
    self.commit_single(Key::balance(to), &balance)
  }

  /// Makes an address refuse (or accept again) incoming value transfers.
  ///
  /// Models recipients whose receive hook fails, so that callers can
  /// observe how a contract handles a failed payout.
  pub fn set_rejects_transfers(
    &mut self,
    address: &Address,
    rejects: bool,
  ) -> Result<(), Error> {
    let key = Key::rejects_transfers(address);
    if rejects {
      self.commit_single(key, &true)
    } else {
      let mut diff = StateDiff::default();
      diff.remove(&key);
      Ok(self.state.apply(diff)?)
    }
  }

  /// Allocates a fresh contract address for a deployment by `deployer`.
  ///
  /// The address is derived from the deployer address and its nonce,
  /// the nonce is incremented.
  pub fn create_address(&mut self, deployer: &Address) -> Result<Address, Error> {
    let nonce = self.nonce_of(deployer)?;
    let address = deployer.derive(&[b"contract", &nonce.to_le_bytes()]);
    self.commit_single(Key::nonce(deployer), &(nonce + 1))?;
    debug!("allocated contract address {address} for {deployer}");
    Ok(address)
  }

  /// Executes a state-changing call against `contract`.
  ///
  /// The value attached to the call is moved to the contract before
  /// `f` runs. If either the value move or `f` fails, nothing is
  /// committed and the error is returned to the caller.
  pub fn execute<T, E, F>(
    &mut self,
    contract: Address,
    call: Call,
    f: F,
  ) -> Result<Receipt<T>, E>
  where
    E: From<Error>,
    F: FnOnce(&mut Env<'_, S>) -> Result<T, E>,
  {
    let height = self.height()? + 1;
    let mut env = Env::new(&self.state, contract, call);
    if !call.value.is_zero() {
      env.move_value(call.caller, contract, call.value)?;
    }

    let output = f(&mut env)?;

    env.put(Key::height(), &height)?;
    let (diff, usage, transfers) = env.into_parts();
    self.state.apply(diff).map_err(Error::from)?;

    debug!(
      "committed call from {} to {contract} at height {height}: {usage:?}",
      call.caller
    );

    Ok(Receipt {
      output,
      height,
      usage,
      transfers,
    })
  }

  /// Executes a read-only call against `contract`.
  ///
  /// The environment is discarded afterwards, so even if the code
  /// attempted writes they never reach the committed state.
  pub fn query<T, E, F>(&self, contract: Address, f: F) -> Result<T, E>
  where
    E: From<Error>,
    F: FnOnce(&Env<'_, S>) -> Result<T, E>,
  {
    let env = Env::new(&self.state, contract, Call::from(Address::ZERO));
    f(&env)
  }

  fn commit_single<T: Serialize>(
    &mut self,
    key: Key,
    value: &T,
  ) -> Result<(), Error> {
    let mut diff = StateDiff::default();
    diff.set(key, rmp_serde::to_vec(value)?);
    Ok(self.state.apply(diff)?)
  }
}

#[cfg(test)]
mod tests {
  use {
    super::{Chain, Error, Transfer},
    crate::{InMemoryStateStore, Key},
    fundme_primitives::{ether, Address, Call},
  };

  fn counter_key(contract: &Address) -> Key {
    Key::derive(contract, &[b"counter"])
  }

  #[test]
  fn successful_call_commits_value_and_writes() -> anyhow::Result<()> {
    let mut chain = Chain::new(InMemoryStateStore::default());
    let alice = Address::named("alice");
    let contract = chain.create_address(&alice)?;
    chain.mint(&alice, ether(10))?;

    let receipt =
      chain.execute(contract, Call::from(alice).with_value(ether(3)), |env| {
        let key = counter_key(&env.address());
        env.store(key, &1u64)?;
        Ok::<_, Error>(env.value())
      })?;

    assert_eq!(receipt.output, ether(3));
    assert_eq!(receipt.height, 1);
    assert_eq!(receipt.usage.writes, 1);
    assert_eq!(receipt.transfers, vec![Transfer {
      from: alice,
      to: contract,
      amount: ether(3),
    }]);
    assert_eq!(chain.balance_of(&alice)?, ether(7));
    assert_eq!(chain.balance_of(&contract)?, ether(3));
    assert_eq!(chain.height()?, 1);
    Ok(())
  }

  #[test]
  fn failed_call_commits_nothing() -> anyhow::Result<()> {
    let mut chain = Chain::new(InMemoryStateStore::default());
    let alice = Address::named("alice");
    let contract = chain.create_address(&alice)?;
    chain.mint(&alice, ether(10))?;

    let result: Result<_, Error> =
      chain.execute(contract, Call::from(alice).with_value(ether(3)), |env| {
        let key = counter_key(&env.address());
        env.store(key, &1u64)?;
        Err::<(), Error>(Error::TransferRejected(env.caller()))
      });

    assert!(matches!(result, Err(Error::TransferRejected(_))));
    assert_eq!(chain.balance_of(&alice)?, ether(10));
    assert_eq!(chain.balance_of(&contract)?, ether(0));
    assert_eq!(chain.height()?, 0);

    let counter: Option<u64> =
      chain.query(contract, |env| env.load(&counter_key(&contract)))?;
    assert_eq!(counter, None);
    Ok(())
  }

  #[test]
  fn call_value_above_balance_is_rejected() -> anyhow::Result<()> {
    let mut chain = Chain::new(InMemoryStateStore::default());
    let bob = Address::named("bob");
    let contract = chain.create_address(&bob)?;
    chain.mint(&bob, ether(1))?;

    let result = chain.execute(
      contract,
      Call::from(bob).with_value(ether(2)),
      |_| Ok::<_, Error>(()),
    );

    assert!(matches!(result, Err(Error::InsufficientFunds { .. })));
    assert_eq!(chain.balance_of(&bob)?, ether(1));
    Ok(())
  }

  #[test]
  fn rejecting_recipient_fails_transfer() -> anyhow::Result<()> {
    let mut chain = Chain::new(InMemoryStateStore::default());
    let owner = Address::named("owner");
    let contract = chain.create_address(&owner)?;
    chain.mint(&contract, ether(5))?;
    chain.set_rejects_transfers(&owner, true)?;

    let result = chain.execute(contract, Call::from(owner), |env| {
      env.transfer(owner, ether(5))
    });
    assert!(matches!(result, Err(Error::TransferRejected(addr)) if addr == owner));
    assert_eq!(chain.balance_of(&contract)?, ether(5));

    chain.set_rejects_transfers(&owner, false)?;
    chain.execute(contract, Call::from(owner), |env| {
      env.transfer(owner, ether(5))
    })?;
    assert_eq!(chain.balance_of(&owner)?, ether(5));
    assert_eq!(chain.balance_of(&contract)?, ether(0));
    Ok(())
  }

  #[test]
  fn contract_addresses_follow_nonce() -> anyhow::Result<()> {
    let mut chain = Chain::new(InMemoryStateStore::default());
    let deployer = Address::named("deployer");
    let first = chain.create_address(&deployer)?;
    let second = chain.create_address(&deployer)?;
    assert_ne!(first, second);
    assert_eq!(chain.nonce_of(&deployer)?, 2);
    Ok(())
  }
}
