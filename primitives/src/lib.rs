mod address;
mod amount;
mod b58;
mod call;

pub use {
  address::{Address, Error as AddressError},
  amount::{
    ether,
    format_ether,
    parse_ether,
    wei_per_ether,
    Amount,
    Error as AmountError,
    NATIVE_DECIMALS,
  },
  b58::ToBase58String,
  call::Call,
  primitive_types::U256,
};
