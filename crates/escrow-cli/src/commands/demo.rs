//! The canonical escrow flow: deploy, fund in three deposits, approve,
//! cash in.

use anyhow::{ensure, Context, Result};
use escrow_core::{InMemoryLedger, SimConfig, WEI_PER_ETHER};
use tracing::info;

const MILLIETHER: u128 = WEI_PER_ETHER / 1000;

pub fn run(config: &SimConfig) -> Result<()> {
    ensure!(
        config.accounts >= 2,
        "demo needs at least two accounts (client and contractor)"
    );
    ensure!(
        config.funding_wei >= 1800 * MILLIETHER,
        "demo deposits total 1.8 ether; raise ESCROW_FUNDING_WEI"
    );

    let (mut ledger, accounts) = InMemoryLedger::genesis(config.accounts, config.funding_wei);
    let (client, contractor) = (accounts[0], accounts[1]);

    let escrow = ledger
        .deploy(client, contractor)
        .context("deploying escrow")?;
    info!(%escrow, %client, %contractor, "milestone escrow deployed");

    for milli in [1000u128, 500, 300] {
        ledger
            .transfer(client, escrow, milli * MILLIETHER)
            .context("depositing")?;
    }
    info!(
        balance_wei = ledger.contract_balance(escrow)?,
        "escrow funded"
    );

    ledger
        .approve_milestone(client, escrow)
        .context("approving milestone")?;
    let payout = ledger
        .cash_in(contractor, escrow)
        .context("cashing in")?;
    info!(amount_wei = payout.amount, recipient = %payout.recipient, "payout applied");

    println!("escrow {escrow}: milestone approved, {} wei paid out", payout.amount);
    println!("client     {client}: {} wei", ledger.account_balance(client)?);
    println!(
        "contractor {contractor}: {} wei",
        ledger.account_balance(contractor)?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_on_default_config() {
        run(&SimConfig::default()).expect("demo");
    }

    #[test]
    fn demo_rejects_underfunded_config() {
        let config = SimConfig::builder()
            .funding_wei(MILLIETHER)
            .build()
            .expect("config");
        assert!(run(&config).is_err());
    }
}
