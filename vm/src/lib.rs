mod key;
mod runtime;
mod state;
mod storage;

pub use {
  key::Key,
  runtime::{Chain, Env, Error, Receipt, Transfer},
  state::{InMemoryStateStore, State, StateDiff, StateError},
  storage::{Storage, Usage},
};
