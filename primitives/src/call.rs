use {
  crate::{Address, Amount},
  serde::{Deserialize, Serialize},
};

/// The invocation context of a single call.
///
/// The caller identity is implicit for the called contract, it cannot be
/// chosen by the contract code. The attached value is moved from the caller
/// to the callee before the contract code runs, and moved back if the call
/// fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
  pub caller: Address,
  pub value: Amount,
}

impl Call {
  /// A call from `caller` that carries no value.
  pub fn from(caller: Address) -> Self {
    Self {
      caller,
      value: Amount::zero(),
    }
  }

  /// Attaches native value to the call.
  pub fn with_value(self, value: Amount) -> Self {
    Self { value, ..self }
  }
}
