use {
  crate::{Error, FeedError, PriceFeed},
  fundme_primitives::{wei_per_ether, Address, Amount, NATIVE_DECIMALS, U256},
  std::{fmt::Debug, sync::Arc},
};

/// Converts native-currency amounts into USD using a [`PriceFeed`].
///
/// Both prices and converted values are fixed point numbers with
/// 18 fractional digits, so "50 USD" is `50 * 10^18`.
#[derive(Clone)]
pub struct PriceOracle {
  feed: Arc<dyn PriceFeed>,
}

impl PriceOracle {
  pub fn new(feed: Arc<dyn PriceFeed>) -> Self {
    Self { feed }
  }

  pub fn feed_address(&self) -> Address {
    self.feed.address()
  }

  /// Latest USD price of one whole unit of the native currency,
  /// normalized to 18 fractional digits.
  ///
  /// A feed reporting with 8 decimals an answer of `2000_00000000`
  /// yields `2000 * 10^18`. Non-positive answers are rejected, and so
  /// are answers that truncate to a zero price at 18 decimals.
  pub fn get_latest_price(&self) -> Result<Amount, Error> {
    let round = self.feed.latest_round_data()?;
    if round.answer <= 0 {
      return Err(FeedError::InvalidAnswer(round.answer).into());
    }

    let answer = Amount::from(round.answer as u128);
    let decimals = self.feed.decimals();
    if u32::from(decimals) <= NATIVE_DECIMALS {
      let scale = U256::exp10((NATIVE_DECIMALS - u32::from(decimals)) as usize);
      return answer.checked_mul(scale).ok_or(Error::ArithmeticOverflow);
    }

    // 10^78 and above do not fit in 256 bits, any answer divides to zero
    let excess = U256::from(u32::from(decimals) - NATIVE_DECIMALS);
    let price = U256::from(10u8)
      .checked_pow(excess)
      .map(|scale| answer / scale)
      .unwrap_or_default();

    if price.is_zero() {
      return Err(
        FeedError::PriceUnderflow {
          answer: round.answer,
          decimals,
        }
        .into(),
      );
    }
    Ok(price)
  }

  /// USD value of `amount` wei, with 18 fractional digits.
  ///
  /// Multiplies before dividing, the result is truncated.
  pub fn get_conversion_rate(&self, amount: Amount) -> Result<Amount, Error> {
    let price = self.get_latest_price()?;
    let product = price.checked_mul(amount).ok_or(Error::ArithmeticOverflow)?;
    Ok(product / wei_per_ether())
  }

  /// Version of the underlying feed.
  pub fn get_version(&self) -> u64 {
    self.feed.version()
  }
}

impl Debug for PriceOracle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PriceOracle")
      .field("feed", &self.feed.address())
      .finish()
  }
}
