use {
  fundme_primitives::{Address, ToBase58String},
  serde::{Deserialize, Serialize},
  std::fmt::{Debug, Display},
};

/// Location of a single value in durable state.
///
/// Keys are derived by hashing the owning address together with a list
/// of seeds, so contracts get disjoint key spaces and can lay out maps
/// and arrays without coordinating with each other.
#[derive(
  Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Key([u8; 32]);

impl Key {
  pub fn derive(namespace: &Address, seeds: &[&[u8]]) -> Self {
    Self(namespace.derive(seeds).to_bytes())
  }

  pub fn as_bytes(&self) -> &[u8; 32] {
    &self.0
  }

  /// Native value held by an address.
  pub(crate) fn balance(address: &Address) -> Self {
    Self::derive(address, &[b"balance"])
  }

  /// Number of contracts created by an address.
  pub(crate) fn nonce(address: &Address) -> Self {
    Self::derive(address, &[b"nonce"])
  }

  /// Set for addresses that refuse incoming value transfers.
  pub(crate) fn rejects_transfers(address: &Address) -> Self {
    Self::derive(address, &[b"rejects-transfers"])
  }

  /// Number of committed calls.
  pub(crate) fn height() -> Self {
    Self::derive(&Address::ZERO, &[b"height"])
  }
}

impl Display for Key {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0.to_b58())
  }
}

impl Debug for Key {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "key({})", self.0.to_b58())
  }
}
