use {
  crate::{Error, Key, State, StateDiff},
  serde::{de::DeserializeOwned, Deserialize, Serialize},
  std::cell::Cell,
};

/// Counts of metered durable storage accesses made by one call.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
pub struct Usage {
  pub reads: u64,
  pub writes: u64,
}

impl Usage {
  /// Cost of reading one value from durable storage.
  pub const READ_COST: u64 = 2_100;

  /// Cost of writing or deleting one value in durable storage.
  pub const WRITE_COST: u64 = 5_000;

  /// Gas estimate of the storage accesses.
  pub fn gas(&self) -> u64 {
    self.reads * Self::READ_COST + self.writes * Self::WRITE_COST
  }
}

/// A write-buffering view over committed state.
///
/// All reads go first to the writes made earlier in the same call and
/// then to the committed state, so a call always observes its own writes.
/// Nothing reaches the committed state until the owning [`crate::Chain`]
/// decides to apply the accumulated diff.
///
/// Contract-facing accessors ([`Storage::load`], [`Storage::store`],
/// [`Storage::remove`]) are metered. Bookkeeping done by the runtime
/// itself (balances, nonces) is not.
pub struct Storage<'a, S: State + ?Sized> {
  base: &'a S,
  diff: StateDiff,
  usage: Cell<Usage>,
}

impl<'a, S: State + ?Sized> Storage<'a, S> {
  pub(crate) fn new(base: &'a S) -> Self {
    Self {
      base,
      diff: StateDiff::default(),
      usage: Cell::new(Usage::default()),
    }
  }

  /// Reads and decodes a value, counting one durable read.
  pub fn load<T: DeserializeOwned>(&self, key: &Key) -> Result<Option<T>, Error> {
    let mut usage = self.usage.get();
    usage.reads += 1;
    self.usage.set(usage);
    self.get(key)
  }

  /// Encodes and writes a value, counting one durable write.
  pub fn store<T: Serialize>(&mut self, key: Key, value: &T) -> Result<(), Error> {
    let mut usage = self.usage.get();
    usage.writes += 1;
    self.usage.set(usage);
    self.put(key, value)
  }

  /// Deletes a value, counting one durable write.
  pub fn remove(&mut self, key: &Key) {
    let mut usage = self.usage.get();
    usage.writes += 1;
    self.usage.set(usage);
    self.diff.remove(key);
  }

  /// Storage accesses made so far.
  pub fn usage(&self) -> Usage {
    self.usage.get()
  }

  pub(crate) fn get<T: DeserializeOwned>(
    &self,
    key: &Key,
  ) -> Result<Option<T>, Error> {
    let bytes = match self.diff.lookup(key) {
      Some(Some(bytes)) => return Ok(Some(rmp_serde::from_slice(bytes)?)),
      Some(None) => return Ok(None),
      None => self.base.get(key)?,
    };

    match bytes {
      Some(bytes) => Ok(Some(rmp_serde::from_slice(&bytes)?)),
      None => Ok(None),
    }
  }

  pub(crate) fn put<T: Serialize>(
    &mut self,
    key: Key,
    value: &T,
  ) -> Result<(), Error> {
    self.diff.set(key, rmp_serde::to_vec(value)?);
    Ok(())
  }

  pub(crate) fn into_parts(self) -> (StateDiff, Usage) {
    (self.diff, self.usage.get())
  }
}

#[cfg(test)]
mod tests {
  use {
    super::{Storage, Usage},
    crate::{InMemoryStateStore, Key, State, StateDiff},
    fundme_primitives::Address,
  };

  fn key(label: &str) -> Key {
    Key::derive(&Address::named("storage-test"), &[label.as_bytes()])
  }

  #[test]
  fn reads_observe_own_writes() -> anyhow::Result<()> {
    let mut committed = InMemoryStateStore::default();
    let mut genesis = StateDiff::default();
    genesis.set(key("x"), rmp_serde::to_vec(&1u64)?);
    committed.apply(genesis)?;

    let mut storage = Storage::new(&committed);
    assert_eq!(storage.load::<u64>(&key("x"))?, Some(1));

    storage.store(key("x"), &2u64)?;
    assert_eq!(storage.load::<u64>(&key("x"))?, Some(2));

    storage.remove(&key("x"));
    assert_eq!(storage.load::<u64>(&key("x"))?, None);

    // committed state is untouched until the diff is applied
    assert_eq!(committed.get(&key("x"))?, Some(rmp_serde::to_vec(&1u64)?));

    let (diff, _) = storage.into_parts();
    committed.apply(diff)?;
    assert!(committed.get(&key("x"))?.is_none());
    Ok(())
  }

  #[test]
  fn metering_counts_contract_accesses_only() -> anyhow::Result<()> {
    let committed = InMemoryStateStore::default();
    let mut storage = Storage::new(&committed);

    storage.store(key("a"), &10u64)?;
    storage.store(key("b"), &20u64)?;
    storage.load::<u64>(&key("a"))?;
    storage.remove(&key("b"));

    // runtime bookkeeping is free
    storage.put(key("c"), &30u64)?;
    storage.get::<u64>(&key("c"))?;

    assert_eq!(storage.usage(), Usage {
      reads: 1,
      writes: 3
    });
    assert_eq!(
      storage.usage().gas(),
      Usage::READ_COST + 3 * Usage::WRITE_COST
    );
    Ok(())
  }
}
