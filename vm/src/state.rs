use {
  crate::Key,
  serde::{Deserialize, Serialize},
  std::collections::{BTreeMap, BTreeSet, HashMap},
  thiserror::Error,
};

#[derive(Debug, Error)]
pub enum StateError {
  #[error("State backend error: {0}")]
  Backend(String),
}

/// Represents a change in durable state.
///
/// Statediffs are meant to be accumulated and logically the entire
/// state of the chain is the result of cumulative application of
/// consecutive state diffs.
///
/// Every committed call produces exactly one state diff. A call that
/// fails produces none, which is what makes calls all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDiff {
  upserts: BTreeMap<Key, Vec<u8>>,
  deletes: BTreeSet<Key>,
}

impl StateDiff {
  /// Inserts or updates a value under a given key.
  ///
  /// If the state diff had a value stored under this key
  /// then the old value is returned, otherwise `None` is returned.
  pub fn set(&mut self, key: Key, value: Vec<u8>) -> Option<Vec<u8>> {
    self.deletes.remove(&key);
    self.upserts.insert(key, value)
  }

  /// Removes a value under a given key.
  ///
  /// If the state diff contained a value at the given key
  /// then the removed value is returned, otherwise `None`.
  pub fn remove(&mut self, key: &Key) -> Option<Vec<u8>> {
    self.deletes.insert(*key);
    self.upserts.remove(key)
  }

  /// What this diff says about a key:
  ///   - `None` when the diff does not touch the key,
  ///   - `Some(None)` when the diff deletes it,
  ///   - `Some(Some(v))` when the diff writes `v`.
  pub fn lookup(&self, key: &Key) -> Option<Option<&Vec<u8>>> {
    if let Some(value) = self.upserts.get(key) {
      return Some(Some(value));
    }
    if self.deletes.contains(key) {
      return Some(None);
    }
    None
  }

  /// Iterate over all changes in a state diff.
  ///
  /// There are two variants of changes:
  ///   1. (Key, Some(value)) => the value under the key was created or
  ///      changed.
  ///   2. (Key, None) => the value under the key was deleted.
  pub fn iter(&self) -> impl Iterator<Item = (&Key, Option<&Vec<u8>>)> {
    self
      .upserts
      .iter()
      .map(|(key, value)| (key, Some(value)))
      .chain(self.deletes.iter().map(|key| (key, None)))
  }
}

/// Durable key-value state that calls execute against.
pub trait State {
  fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, StateError>;
  fn apply(&mut self, diff: StateDiff) -> Result<(), StateError>;
}

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
  data: HashMap<Key, Vec<u8>>,
}

impl InMemoryStateStore {
  pub fn iter(&self) -> impl Iterator<Item = (&Key, &Vec<u8>)> {
    self.data.iter()
  }
}

impl State for InMemoryStateStore {
  fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, StateError> {
    Ok(self.data.get(key).cloned())
  }

  fn apply(&mut self, diff: StateDiff) -> Result<(), StateError> {
    for (k, v) in diff.upserts {
      self.data.insert(k, v);
    }

    for key in diff.deletes {
      self.data.remove(&key);
    }

    Ok(())
  }
}
