//! A crowdfunding ledger that only accepts contributions worth at least
//! a fixed amount of USD, valued through an external price feed, and lets
//! its owner withdraw everything collected.
//!
//! Two withdrawal algorithms are provided. They have the same observable
//! effects and differ only in how many storage reads they perform.

pub mod config;
pub mod deploy;
mod error;
mod feed;
mod ledger;
mod oracle;

pub use {
  error::Error,
  feed::{FeedError, MockRound, MockState, MockV3Aggregator, PriceFeed, RoundData},
  ledger::{FundingLedger, MINIMUM_USD},
  oracle::PriceOracle,
};
