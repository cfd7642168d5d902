use {
  crate::{
    node::{resolve_account, Node},
    settings::{Command, SystemSettings},
  },
  clap::Parser,
  fundme_primitives::{ether, format_ether, parse_ether, Address},
  tracing::info,
  tracing_subscriber::EnvFilter,
};

mod node;
mod settings;
mod storage;

fn demo(node: &mut Node) -> anyhow::Result<()> {
  let owner = Address::named(node::ACCOUNTS[0]);
  let ledger = node.deploy(owner)?;
  info!("demo ledger deployed at {}", ledger.address());

  for name in &node::ACCOUNTS[1..] {
    let receipt = node.fund(resolve_account(name)?, ether(1))?;
    info!("{name} funded 1 ETH, gas {}", receipt.usage.gas());
  }

  let before = node.balance_of(&owner)?;
  let receipt = node.withdraw(owner, true)?;
  info!(
    "owner withdrew {} ETH (gas {}), balance {} -> {} ETH",
    format_ether(receipt.output),
    receipt.usage.gas(),
    format_ether(before),
    format_ether(node.balance_of(&owner)?)
  );

  print_status(node)
}

fn print_status(node: &mut Node) -> anyhow::Result<()> {
  let status = node.status()?;
  println!("ledger:  {}", status.ledger);
  println!("owner:   {}", status.owner);
  println!("feed:    {} (version {})", status.feed, status.version);
  match status.price {
    Some(price) => println!("price:   {} USD/ETH", format_ether(price)),
    None => println!("price:   unavailable"),
  }
  println!("balance: {} ETH", format_ether(status.balance));
  println!("funders: {}", status.funders.len());
  for (index, (funder, amount)) in status.funders.iter().enumerate() {
    println!("  [{index}] {funder} {} ETH", format_ether(*amount));
  }
  Ok(())
}

fn main() -> anyhow::Result<()> {
  // configure logging, RUST_LOG overrides the default level
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info")),
    )
    .init();

  // gather CLI parameters
  let settings = SystemSettings::parse();
  info!("startup settings: {settings:#?}");

  let (state, registry) = settings.storage()?;
  let mut node = Node::new(settings.network(), state, registry)?;

  match &settings.command {
    Command::Accounts => {
      for (name, address, balance) in node.accounts()? {
        println!("{name:<10} {address} {} ETH", format_ether(balance));
      }
    }
    Command::Deploy { from } => {
      let ledger = node.deploy(resolve_account(from)?)?;
      println!("{}", ledger.address());
    }
    Command::Fund { from, value } => {
      info!("funding contract...");
      let receipt = node.fund(resolve_account(from)?, parse_ether(value)?)?;
      info!("funded! gas used: {}", receipt.usage.gas());
    }
    Command::Withdraw { from, cheaper } => {
      info!("withdrawing from contract...");
      let receipt = node.withdraw(resolve_account(from)?, *cheaper)?;
      info!(
        "got {} ETH back! gas used: {}",
        format_ether(receipt.output),
        receipt.usage.gas()
      );
    }
    Command::Status => print_status(&mut node)?,
    Command::SetPrice { answer } => node.set_price(*answer)?,
    Command::Demo => demo(&mut node)?,
  }

  Ok(())
}
