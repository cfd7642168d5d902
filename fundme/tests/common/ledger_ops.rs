use {
  super::Fixture,
  fundme::Error,
  fundme_primitives::{Address, Amount},
  fundme_vm::{Receipt, Transfer},
  std::collections::BTreeMap,
};

/// Everything observable about the ledger and a set of accounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observed {
  pub ledger_balance: Amount,
  pub funders: Vec<Address>,
  pub amounts: BTreeMap<Address, Amount>,
  pub balances: BTreeMap<Address, Amount>,
}

pub fn observe(fixture: &Fixture, accounts: &[Address]) -> Result<Observed, Error> {
  let funders = (0..fixture.funder_count()?)
    .map(|index| fixture.funder(index))
    .collect::<Result<Vec<_>, _>>()?;

  let mut amounts = BTreeMap::new();
  let mut balances = BTreeMap::new();
  for account in accounts.iter().chain(std::iter::once(&fixture.owner)) {
    amounts.insert(*account, fixture.amount_funded(account)?);
    balances.insert(*account, fixture.balance_of(account)?);
  }

  Ok(Observed {
    ledger_balance: fixture.ledger_balance()?,
    funders,
    amounts,
    balances,
  })
}

/// Sum of all recorded contributions equals the native balance held by
/// the ledger.
pub fn assert_fully_backed(observed: &Observed) {
  let total = observed
    .amounts
    .values()
    .fold(Amount::zero(), |acc, amount| acc + *amount);
  assert_eq!(total, observed.ledger_balance);
}

/// Post-state of a successful withdrawal by `owner`, regardless of the
/// algorithm used.
pub fn assert_withdrawn(
  fixture: &Fixture,
  before: &Observed,
  after: &Observed,
  receipt: &Receipt<Amount>,
) {
  let owner = fixture.owner;

  assert!(after.funders.is_empty());
  assert!(after.amounts.values().all(Amount::is_zero));
  assert!(after.ledger_balance.is_zero());

  assert_eq!(receipt.output, before.ledger_balance);
  assert_eq!(receipt.transfers, vec![Transfer {
    from: fixture.ledger.address(),
    to: owner,
    amount: before.ledger_balance,
  }]);

  for (account, balance) in &after.balances {
    let expected = if *account == owner {
      before.balances[account] + before.ledger_balance
    } else {
      before.balances[account]
    };
    assert_eq!(*balance, expected, "balance of {account}");
  }
}
