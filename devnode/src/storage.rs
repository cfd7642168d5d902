use {
  fundme::MockState,
  fundme_primitives::Address,
  fundme_vm::{InMemoryStateStore, Key, State, StateDiff, StateError},
  rmp_serde::{from_slice, to_vec},
  serde::{Deserialize, Serialize},
  std::collections::HashMap,
};

fn backend(error: sled::Error) -> StateError {
  StateError::Backend(error.to_string())
}

pub struct OnDiskStateStore {
  tree: sled::Tree,
}

impl OnDiskStateStore {
  pub fn new(db: &sled::Db, name: &str) -> Result<Self, sled::Error> {
    Ok(Self {
      tree: db.open_tree(name)?,
    })
  }
}

impl State for OnDiskStateStore {
  fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, StateError> {
    Ok(
      self
        .tree
        .get(key.as_bytes())
        .map_err(backend)?
        .map(|bytes| bytes.to_vec()),
    )
  }

  fn apply(&mut self, diff: StateDiff) -> Result<(), StateError> {
    let mut batch = sled::Batch::default();
    for (key, value) in diff.iter() {
      match value {
        Some(value) => batch.insert(&key.as_bytes()[..], value.as_slice()),
        None => batch.remove(&key.as_bytes()[..]),
      }
    }
    self.tree.apply_batch(batch).map_err(backend)?;
    self.tree.flush().map_err(backend)?;
    Ok(())
  }
}

/// Chain state of the devnode.
pub enum NodeState {
  Ephemeral(InMemoryStateStore),
  OnDisk(OnDiskStateStore),
}

impl NodeState {
  pub fn ephemeral() -> Self {
    Self::Ephemeral(InMemoryStateStore::default())
  }

  pub fn on_disk(db: &sled::Db) -> Result<Self, sled::Error> {
    Ok(Self::OnDisk(OnDiskStateStore::new(db, "state")?))
  }
}

impl State for NodeState {
  fn get(&self, key: &Key) -> Result<Option<Vec<u8>>, StateError> {
    match self {
      Self::Ephemeral(store) => store.get(key),
      Self::OnDisk(store) => store.get(key),
    }
  }

  fn apply(&mut self, diff: StateDiff) -> Result<(), StateError> {
    match self {
      Self::Ephemeral(store) => store.apply(diff),
      Self::OnDisk(store) => store.apply(diff),
    }
  }
}

/// Where a ledger was deployed on a network and the state of the mock
/// feed it prices contributions with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
  pub ledger: Address,
  pub owner: Address,
  pub feed: Address,
  pub mock: MockState,
}

/// Devnode bookkeeping that is not part of the chain state.
pub struct Registry {
  tree: Option<sled::Tree>,
  memory: HashMap<String, Vec<u8>>,
}

impl Registry {
  const GENESIS: &'static str = "genesis";

  pub fn ephemeral() -> Self {
    Self {
      tree: None,
      memory: HashMap::new(),
    }
  }

  pub fn on_disk(db: &sled::Db) -> Result<Self, sled::Error> {
    Ok(Self {
      tree: Some(db.open_tree("registry")?),
      memory: HashMap::new(),
    })
  }

  pub fn genesis_done(&self) -> anyhow::Result<bool> {
    Ok(self.read(Self::GENESIS)?.is_some())
  }

  pub fn mark_genesis(&mut self) -> anyhow::Result<()> {
    self.write(Self::GENESIS, to_vec(&true)?)
  }

  pub fn deployment(
    &self,
    network: &str,
  ) -> anyhow::Result<Option<DeploymentRecord>> {
    match self.read(&deployment_key(network))? {
      Some(bytes) => Ok(Some(from_slice(&bytes)?)),
      None => Ok(None),
    }
  }

  pub fn save_deployment(
    &mut self,
    network: &str,
    record: &DeploymentRecord,
  ) -> anyhow::Result<()> {
    self.write(&deployment_key(network), to_vec(record)?)
  }

  fn read(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
    match &self.tree {
      Some(tree) => Ok(tree.get(key)?.map(|bytes| bytes.to_vec())),
      None => Ok(self.memory.get(key).cloned()),
    }
  }

  fn write(&mut self, key: &str, value: Vec<u8>) -> anyhow::Result<()> {
    match &self.tree {
      Some(tree) => {
        tree.insert(key, value)?;
        tree.flush()?;
      }
      None => {
        self.memory.insert(key.to_owned(), value);
      }
    }
    Ok(())
  }
}

fn deployment_key(network: &str) -> String {
  format!("deployment/{network}")
}
