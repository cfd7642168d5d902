use {
  serde::{Deserialize, Serialize},
  sha2::{Digest, Sha256},
  std::{
    fmt::{Debug, Display},
    str::FromStr,
  },
  thiserror::Error,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("Invalid base58 address encoding: {0}")]
  Encoding(#[from] bs58::decode::Error),

  #[error("Address must be exactly 32 bytes long, got {0} bytes")]
  Length(usize),
}

/// Represents an identity on the chain.
///
/// The same address type is used for externally owned accounts
/// (contributors, the deployer) and for contracts (the ledger, price
/// feeds). Contract addresses are derived from the deployer address
/// and its nonce, so they are deterministic for a given history of
/// deployments.
#[derive(
  Copy,
  Clone,
  Default,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
)]
pub struct Address([u8; 32]);

impl Address {
  /// The all-zeros address. Used as the caller of read-only queries
  /// and as the namespace of chain-wide bookkeeping values.
  pub const ZERO: Address = Address([0u8; 32]);

  /// Given a list of seeds this method will generate a new
  /// address derived from this one.
  ///
  /// The same set of seeds will always return the same
  /// derived address, so it can be used to compute contract
  /// addresses and storage locations.
  pub fn derive(&self, seeds: &[&[u8]]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(self.0);
    for seed in seeds.iter() {
      hasher.update(seed);
    }
    Address(hasher.finalize().into())
  }

  /// Deterministic address for a human readable account label.
  ///
  /// Development networks use it to give stable identities to
  /// accounts like "deployer" or "alice".
  pub fn named(label: &str) -> Self {
    Self::ZERO.derive(&[b"named", label.as_bytes()])
  }

  pub const fn to_bytes(self) -> [u8; 32] {
    self.0
  }
}

impl Display for Address {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", bs58::encode(self.0).into_string())
  }
}

impl Debug for Address {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "address({})", bs58::encode(self.0).into_string())
  }
}

impl FromStr for Address {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let decoded = bs58::decode(s).into_vec()?;
    if decoded.len() != 32 {
      return Err(Error::Length(decoded.len()));
    }
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&decoded);
    Ok(Self(bytes))
  }
}
