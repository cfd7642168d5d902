use {
  common::{accounts, ledger_ops, seeded_rng, Fixture},
  fundme::{Error, FeedError, MINIMUM_USD},
  fundme_primitives::{ether, parse_ether, Amount},
  rand::Rng,
};

mod common;

#[test]
fn fund_below_minimum_is_rejected() -> anyhow::Result<()> {
  let mut fixture = Fixture::new()?;
  let alice = accounts(1)[0];
  let before = ledger_ops::observe(&fixture, &[alice])?;

  // 49 USD at 2000 USD per ether
  let result = fixture.fund(alice, parse_ether("0.0245")?);
  assert!(matches!(
    result,
    Err(Error::InsufficientContribution { converted, minimum })
      if converted == ether(49) && minimum == MINIMUM_USD
  ));

  // the attached value never left the sender
  assert_eq!(ledger_ops::observe(&fixture, &[alice])?, before);
  Ok(())
}

#[test]
fn fund_at_exact_minimum_succeeds() -> anyhow::Result<()> {
  let mut fixture = Fixture::new()?;
  let alice = accounts(1)[0];

  // exactly 50 USD
  fixture.fund(alice, parse_ether("0.025")?)?;
  assert_eq!(fixture.amount_funded(&alice)?, parse_ether("0.025")?);

  // one wei less is short of the minimum by 2000 USD-wei
  let short = parse_ether("0.025")? - Amount::one();
  assert!(matches!(
    fixture.fund(alice, short),
    Err(Error::InsufficientContribution { .. })
  ));
  Ok(())
}

#[test]
fn zero_value_fund_is_rejected() -> anyhow::Result<()> {
  let mut fixture = Fixture::new()?;
  let alice = accounts(1)[0];
  assert!(matches!(
    fixture.fund(alice, Amount::zero()),
    Err(Error::InsufficientContribution { converted, .. }) if converted.is_zero()
  ));
  assert_eq!(fixture.funder_count()?, 0);
  Ok(())
}

#[test]
fn updates_amount_funded_data_structure() -> anyhow::Result<()> {
  let mut fixture = Fixture::new()?;
  let deployer = fixture.owner;

  fixture.fund(deployer, ether(1))?;
  assert_eq!(fixture.amount_funded(&deployer)?, ether(1));
  assert_eq!(fixture.funder(0)?, deployer);
  Ok(())
}

#[test]
fn repeated_funding_accumulates_and_appends() -> anyhow::Result<()> {
  let mut fixture = Fixture::new()?;
  let alice = accounts(1)[0];

  fixture.fund(alice, ether(1))?;
  fixture.fund(alice, parse_ether("0.5")?)?;

  assert_eq!(fixture.amount_funded(&alice)?, parse_ether("1.5")?);
  assert_eq!(fixture.funder_count()?, 2);
  assert_eq!(fixture.funder(0)?, alice);
  assert_eq!(fixture.funder(1)?, alice);
  assert!(matches!(
    fixture.funder(2),
    Err(Error::IndexOutOfRange { index: 2, len: 2 })
  ));
  assert_eq!(fixture.ledger_balance()?, parse_ether("1.5")?);
  Ok(())
}

#[test]
fn contributions_always_sum_to_ledger_balance() -> anyhow::Result<()> {
  let mut fixture = Fixture::new()?;
  let accounts = accounts(6);
  let mut rng = seeded_rng();

  let mut succeeded = 0;
  for _ in 0..40 {
    let funder = accounts[rng.gen_range(0..accounts.len())];

    // between 0.001 and 1 ether, so some are below the 0.025 minimum
    let value = parse_ether("0.001")? * rng.gen_range(1..=1000u64);
    let expected_ok = value >= parse_ether("0.025")?;

    match fixture.fund(funder, value) {
      Ok(_) => {
        assert!(expected_ok);
        succeeded += 1;
      }
      Err(Error::InsufficientContribution { .. }) => assert!(!expected_ok),
      Err(e) => return Err(e.into()),
    }

    let observed = ledger_ops::observe(&fixture, &accounts)?;
    ledger_ops::assert_fully_backed(&observed);
    assert_eq!(observed.funders.len(), succeeded);
  }
  Ok(())
}

#[test]
fn non_positive_price_fails_with_oracle_unavailable() -> anyhow::Result<()> {
  let mut fixture = Fixture::new()?;
  let alice = accounts(1)[0];

  fixture.feed.update_answer(0);
  assert!(matches!(
    fixture.fund(alice, ether(1)),
    Err(Error::OracleUnavailable(FeedError::InvalidAnswer(0)))
  ));

  fixture.feed.update_answer(-2000_00000000);
  assert!(matches!(
    fixture.fund(alice, ether(1)),
    Err(Error::OracleUnavailable(FeedError::InvalidAnswer(_)))
  ));

  assert_eq!(fixture.ledger_balance()?, Amount::zero());
  assert_eq!(fixture.funder_count()?, 0);
  Ok(())
}

#[test]
fn unreachable_feed_fails_with_oracle_unavailable() -> anyhow::Result<()> {
  let mut fixture = Fixture::new()?;
  let alice = accounts(1)[0];

  fixture.feed.disconnect();
  assert!(matches!(
    fixture.fund(alice, ether(1)),
    Err(Error::OracleUnavailable(FeedError::Unreachable(_)))
  ));

  fixture.feed.reconnect();
  fixture.fund(alice, ether(1))?;
  assert_eq!(fixture.amount_funded(&alice)?, ether(1));
  Ok(())
}

#[test]
fn price_changes_move_the_minimum() -> anyhow::Result<()> {
  let mut fixture = Fixture::new()?;
  let alice = accounts(1)[0];

  // 0.025 ether is only 25 USD at 1000 USD per ether
  fixture.feed.update_answer(1000_00000000);
  assert!(matches!(
    fixture.fund(alice, parse_ether("0.025")?),
    Err(Error::InsufficientContribution { converted, .. }) if converted == ether(25)
  ));
  fixture.fund(alice, parse_ether("0.05")?)?;
  Ok(())
}

#[test]
fn value_above_sender_balance_fails_in_environment() -> anyhow::Result<()> {
  let mut fixture = Fixture::new()?;
  let alice = accounts(1)[0];
  let result = fixture.fund(alice, ether(common::GENESIS_BALANCE + 1));
  assert!(matches!(result, Err(Error::Vm(_))));
  assert_eq!(fixture.funder_count()?, 0);
  Ok(())
}
