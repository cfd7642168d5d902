use {primitive_types::U256, thiserror::Error};

/// Native value and reference-currency values are both 256-bit
/// unsigned fixed point numbers with 18 implicit decimals.
pub type Amount = U256;

/// Number of fractional digits of the native value unit (wei).
pub const NATIVE_DECIMALS: u32 = 18;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  #[error("Empty amount")]
  Empty,

  #[error("Invalid character in amount '{0}'")]
  InvalidDigit(String),

  #[error("Amount '{0}' has more than 18 fractional digits")]
  TooPrecise(String),

  #[error("Amount '{0}' does not fit in 256 bits")]
  Overflow(String),
}

/// 10^18, the number of wei in one ether.
pub fn wei_per_ether() -> Amount {
  U256::exp10(NATIVE_DECIMALS as usize)
}

/// Whole ethers expressed in wei.
pub fn ether(n: u64) -> Amount {
  U256::from(n) * wei_per_ether()
}

/// Parses a decimal ether string like "0.1" or "25" into wei.
pub fn parse_ether(value: &str) -> Result<Amount, Error> {
  let value = value.trim();
  if value.is_empty() {
    return Err(Error::Empty);
  }

  let (whole, fraction) = match value.split_once('.') {
    Some((w, f)) => (w, f),
    None => (value, ""),
  };

  if whole.is_empty() && fraction.is_empty() {
    return Err(Error::Empty);
  }

  let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
  if !is_digits(whole) || !is_digits(fraction) {
    return Err(Error::InvalidDigit(value.to_owned()));
  }

  if fraction.len() > NATIVE_DECIMALS as usize {
    return Err(Error::TooPrecise(value.to_owned()));
  }

  // "1.5" -> "1" ++ "500000000000000000"
  let mut digits = String::with_capacity(whole.len() + 18);
  digits.push_str(whole);
  digits.push_str(fraction);
  for _ in fraction.len()..NATIVE_DECIMALS as usize {
    digits.push('0');
  }

  let digits = digits.trim_start_matches('0');
  if digits.is_empty() {
    return Ok(U256::zero());
  }

  U256::from_dec_str(digits).map_err(|_| Error::Overflow(value.to_owned()))
}

/// Renders a wei amount as a decimal ether string, without
/// trailing fractional zeros.
pub fn format_ether(amount: Amount) -> String {
  let unit = wei_per_ether();
  let whole = amount / unit;
  let fraction = amount % unit;
  if fraction.is_zero() {
    return whole.to_string();
  }

  let fraction = format!("{:0>18}", fraction.to_string());
  format!("{}.{}", whole, fraction.trim_end_matches('0'))
}
