//! Scripted scenario execution.
//!
//! A scenario is a JSON file describing a genesis setup plus a sequence of
//! steps against a single escrow instance. Account indices refer to genesis
//! order; account 0 deploys and owns the escrow.

use std::path::Path;

use anyhow::{bail, Context, Result};
use escrow_core::{Address, ContractId, InMemoryLedger, Wei, WEI_PER_ETHER};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    /// Number of genesis accounts.
    #[serde(default = "default_accounts")]
    pub accounts: u32,

    /// Initial funding per genesis account, in wei.
    #[serde(default = "default_funding")]
    pub funding_wei: Wei,

    /// Genesis index of the contractor.
    #[serde(default = "default_contractor")]
    pub contractor: usize,

    pub steps: Vec<Step>,
}

fn default_accounts() -> u32 {
    3
}

fn default_funding() -> Wei {
    10 * WEI_PER_ETHER
}

fn default_contractor() -> usize {
    1
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Deposit { from: usize, amount_wei: Wei },
    Approve { caller: usize },
    CashIn { caller: usize },
    ExpectContractBalance { amount_wei: Wei },
    ExpectAccountBalance { account: usize, amount_wei: Wei },
}

pub fn run(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading scenario file {}", file.display()))?;
    let scenario: Scenario = serde_json::from_str(&text)
        .with_context(|| format!("parsing scenario file {}", file.display()))?;
    execute(&scenario)
}

pub fn execute(scenario: &Scenario) -> Result<()> {
    let (mut ledger, accounts) =
        InMemoryLedger::genesis(scenario.accounts, scenario.funding_wei);
    let client = account(&accounts, 0)?;
    let contractor = account(&accounts, scenario.contractor)?;
    let escrow = ledger
        .deploy(client, contractor)
        .context("deploying escrow")?;
    info!(%escrow, %client, %contractor, "scenario deployment ready");

    for (index, step) in scenario.steps.iter().enumerate() {
        apply(&mut ledger, &accounts, escrow, *step)
            .with_context(|| format!("step {index}: {step:?}"))?;
    }

    println!("scenario ok: {} steps", scenario.steps.len());
    Ok(())
}

fn apply(
    ledger: &mut InMemoryLedger,
    accounts: &[Address],
    escrow: ContractId,
    step: Step,
) -> Result<()> {
    match step {
        Step::Deposit { from, amount_wei } => {
            ledger.transfer(account(accounts, from)?, escrow, amount_wei)?;
        }
        Step::Approve { caller } => {
            ledger.approve_milestone(account(accounts, caller)?, escrow)?;
        }
        Step::CashIn { caller } => {
            let payout = ledger.cash_in(account(accounts, caller)?, escrow)?;
            info!(amount_wei = payout.amount, "cash in succeeded");
        }
        Step::ExpectContractBalance { amount_wei } => {
            let actual = ledger.contract_balance(escrow)?;
            if actual != amount_wei {
                bail!("expected contract balance {amount_wei} wei, found {actual}");
            }
        }
        Step::ExpectAccountBalance {
            account: index,
            amount_wei,
        } => {
            let actual = ledger.account_balance(account(accounts, index)?)?;
            if actual != amount_wei {
                bail!("expected account {index} balance {amount_wei} wei, found {actual}");
            }
        }
    }
    Ok(())
}

fn account(accounts: &[Address], index: usize) -> Result<Address> {
    accounts
        .get(index)
        .copied()
        .with_context(|| format!("account index {index} out of range ({} accounts)", accounts.len()))
}
