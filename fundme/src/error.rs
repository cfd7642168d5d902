use {
  crate::FeedError,
  fundme_primitives::{Address, Amount},
  thiserror::Error,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error(
    "You need to spend more ETH! Contribution is worth {converted} USD-wei, \
     the minimum is {minimum}"
  )]
  InsufficientContribution { converted: Amount, minimum: Amount },

  #[error("FundMe__NotOwner: {caller} is not the owner of the ledger")]
  NotOwner { caller: Address },

  #[error("Transfer of funds to the owner failed: {0}")]
  TransferFailed(#[source] fundme_vm::Error),

  #[error("Price oracle unavailable: {0}")]
  OracleUnavailable(#[from] FeedError),

  #[error("Funder index {index} out of range, the list has {len} entries")]
  IndexOutOfRange { index: u64, len: u64 },

  #[error("Arithmetic overflow")]
  ArithmeticOverflow,

  #[error("Execution environment error: {0}")]
  Vm(#[from] fundme_vm::Error),
}
