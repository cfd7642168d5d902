use {
  fundme_primitives::Address,
  parking_lot::RwLock,
  serde::{Deserialize, Serialize},
  std::collections::BTreeMap,
  thiserror::Error,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
  #[error("Price feed {0} is unreachable")]
  Unreachable(Address),

  #[error("Price feed reported a non-positive answer {0}")]
  InvalidAnswer(i128),

  #[error("No data present for round {0}")]
  NoDataPresent(u64),

  #[error(
    "Answer {answer} with {decimals} decimals is below the smallest \
     representable price"
  )]
  PriceUnderflow { answer: i128, decimals: u8 },
}

/// One reporting round of a price feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundData {
  pub round_id: u64,

  /// Reported price as an integer with [`PriceFeed::decimals`]
  /// implicit fractional digits.
  pub answer: i128,

  pub started_at: u64,
  pub updated_at: u64,
  pub answered_in_round: u64,
}

/// Read interface of an external exchange-rate feed.
///
/// The ledger only ever asks for the latest round. Staleness of the
/// reported data is the feed's own concern.
pub trait PriceFeed: Send + Sync {
  /// Address under which the feed is deployed.
  fn address(&self) -> Address;

  /// Number of implicit fractional digits of the answers.
  fn decimals(&self) -> u8;

  fn description(&self) -> String;

  fn version(&self) -> u64;

  fn latest_round_data(&self) -> Result<RoundData, FeedError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockRound {
  pub answer: i128,
  pub started_at: u64,
  pub updated_at: u64,
}

/// Complete state of a [`MockV3Aggregator`], used to persist a mock
/// feed between runs of a development node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockState {
  pub decimals: u8,
  pub latest_round: u64,
  pub rounds: BTreeMap<u64, MockRound>,
  pub connected: bool,
}

/// Deterministic stand-in for a V3 aggregator feed.
///
/// Every answer update opens a new round. The feed can be disconnected
/// to simulate an unreachable oracle.
#[derive(Debug)]
pub struct MockV3Aggregator {
  address: Address,
  state: RwLock<MockState>,
}

impl MockV3Aggregator {
  pub const VERSION: u64 = 0;
  pub const DESCRIPTION: &'static str = "v0.6/tests/MockV3Aggregator.sol";

  pub fn new(address: Address, decimals: u8, initial_answer: i128) -> Self {
    let feed = Self::restore(address, MockState {
      decimals,
      latest_round: 0,
      rounds: BTreeMap::new(),
      connected: true,
    });
    feed.update_answer(initial_answer);
    feed
  }

  pub fn restore(address: Address, state: MockState) -> Self {
    Self {
      address,
      state: RwLock::new(state),
    }
  }

  pub fn snapshot(&self) -> MockState {
    self.state.read().clone()
  }

  /// Reports a new answer in a new round, timestamped now.
  pub fn update_answer(&self, answer: i128) {
    let now = unix_now();
    let mut state = self.state.write();
    state.latest_round += 1;
    let round = state.latest_round;
    state.rounds.insert(round, MockRound {
      answer,
      started_at: now,
      updated_at: now,
    });
  }

  /// Overwrites the data of an explicit round and makes it the latest.
  pub fn update_round_data(
    &self,
    round_id: u64,
    answer: i128,
    updated_at: u64,
    started_at: u64,
  ) {
    let mut state = self.state.write();
    state.latest_round = round_id;
    state.rounds.insert(round_id, MockRound {
      answer,
      started_at,
      updated_at,
    });
  }

  pub fn get_round_data(&self, round_id: u64) -> Result<RoundData, FeedError> {
    let state = self.state.read();
    if !state.connected {
      return Err(FeedError::Unreachable(self.address));
    }
    state
      .rounds
      .get(&round_id)
      .map(|round| RoundData {
        round_id,
        answer: round.answer,
        started_at: round.started_at,
        updated_at: round.updated_at,
        answered_in_round: round_id,
      })
      .ok_or(FeedError::NoDataPresent(round_id))
  }

  pub fn latest_answer(&self) -> Option<i128> {
    let state = self.state.read();
    state.rounds.get(&state.latest_round).map(|r| r.answer)
  }

  /// Makes every subsequent read fail as unreachable.
  pub fn disconnect(&self) {
    self.state.write().connected = false;
  }

  pub fn reconnect(&self) {
    self.state.write().connected = true;
  }
}

impl PriceFeed for MockV3Aggregator {
  fn address(&self) -> Address {
    self.address
  }

  fn decimals(&self) -> u8 {
    self.state.read().decimals
  }

  fn description(&self) -> String {
    Self::DESCRIPTION.to_owned()
  }

  fn version(&self) -> u64 {
    Self::VERSION
  }

  fn latest_round_data(&self) -> Result<RoundData, FeedError> {
    let latest = self.state.read().latest_round;
    self.get_round_data(latest)
  }
}

fn unix_now() -> u64 {
  time::OffsetDateTime::now_utc().unix_timestamp().max(0) as u64
}
