//! In-memory ledger simulation.
//!
//! The ledger is the hosting environment for escrow instances: it owns
//! external account balances and deployed contracts, and it is the only
//! place where value crosses the boundary between the two. Every operation
//! is a single transaction: on `Err` the ledger and all contracts are
//! byte-identical to their pre-call state.

use std::collections::BTreeMap;

use tracing::debug;

use crate::contract::{MilestoneEscrow, Payout};
use crate::math::{add_wei, sub_wei};
use crate::{Address, ContractId, EscrowError, Result, Wei};

/// In-memory accounts-and-contracts ledger for development and testing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryLedger {
    accounts: BTreeMap<Address, Wei>,
    contracts: BTreeMap<ContractId, MilestoneEscrow>,
    next_account: u64,
    next_contract: u64,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger pre-populated with `count` accounts, each funded
    /// with `funding` wei. Returns the accounts in creation order.
    pub fn genesis(count: u32, funding: Wei) -> (Self, Vec<Address>) {
        let mut ledger = Self::new();
        let accounts = (0..count).map(|_| ledger.create_account(funding)).collect();
        (ledger, accounts)
    }

    /// Create a fresh externally-owned account holding `initial` wei.
    ///
    /// Addresses are derived from a ledger-local counter, so a given
    /// creation order always yields the same addresses.
    pub fn create_account(&mut self, initial: Wei) -> Address {
        self.next_account += 1;
        let mut bytes = [0u8; 20];
        bytes[12..20].copy_from_slice(&self.next_account.to_be_bytes());
        let address = Address::new(bytes);
        self.accounts.insert(address, initial);
        address
    }

    /// Credit an existing account with `amount` wei (faucet path).
    pub fn fund(&mut self, account: Address, amount: Wei) -> Result<()> {
        let held = self.account_balance(account)?;
        let credited = add_wei(held, amount)?;
        self.accounts.insert(account, credited);
        Ok(())
    }

    /// Deploy a new escrow instance. The deployer becomes its owner.
    pub fn deploy(&mut self, deployer: Address, contractor: Address) -> Result<ContractId> {
        // The deployer must exist on this ledger; the contractor is just an
        // identity and may never have held funds here.
        self.account_balance(deployer)?;

        self.next_contract += 1;
        let id = ContractId(self.next_contract);
        self.contracts
            .insert(id, MilestoneEscrow::new(deployer, contractor));
        debug!(%id, %deployer, %contractor, "escrow deployed");
        Ok(id)
    }

    /// Transfer value from an external account into a contract (the
    /// implicit deposit endpoint).
    pub fn transfer(&mut self, from: Address, to: ContractId, amount: Wei) -> Result<()> {
        let held = self.account_balance(from)?;
        if held < amount {
            return Err(EscrowError::InsufficientFunds {
                account: from,
                held,
                needed: amount,
            });
        }
        let debited = sub_wei(held, amount)?;

        let escrow = self
            .contracts
            .get_mut(&to)
            .ok_or(EscrowError::UnknownContract(to))?;
        escrow.deposit(amount)?;
        self.accounts.insert(from, debited);
        debug!(%from, %to, amount, "deposit accepted");
        Ok(())
    }

    /// Dispatch `approveMilestone` on a deployed contract.
    pub fn approve_milestone(&mut self, caller: Address, id: ContractId) -> Result<()> {
        let escrow = self
            .contracts
            .get_mut(&id)
            .ok_or(EscrowError::UnknownContract(id))?;
        escrow.approve_milestone(caller)?;
        debug!(%caller, %id, "milestone approved");
        Ok(())
    }

    /// Dispatch `cashIn` on a deployed contract and apply the resulting
    /// payout to the contractor's external balance.
    pub fn cash_in(&mut self, caller: Address, id: ContractId) -> Result<Payout> {
        // Run the contract call on a scratch copy first: the contract's own
        // checks keep their documented order, and nothing commits until both
        // the payout and the recipient credit are known to succeed.
        let mut preview = self.contract(id)?.clone();
        let payout = preview.cash_in(caller)?;

        let held = self.accounts.get(&payout.recipient).copied().unwrap_or(0);
        let credited = add_wei(held, payout.amount)?;

        let escrow = self
            .contracts
            .get_mut(&id)
            .ok_or(EscrowError::UnknownContract(id))?;
        *escrow = preview;
        self.accounts.insert(payout.recipient, credited);
        debug!(%caller, %id, recipient = %payout.recipient, amount = payout.amount, "payout applied");
        Ok(payout)
    }

    /// External balance of an account.
    pub fn account_balance(&self, account: Address) -> Result<Wei> {
        self.accounts
            .get(&account)
            .copied()
            .ok_or(EscrowError::UnknownAccount(account))
    }

    /// Escrowed balance of a deployed contract.
    pub fn contract_balance(&self, id: ContractId) -> Result<Wei> {
        Ok(self.contract(id)?.balance())
    }

    /// Read-only view of a deployed contract.
    pub fn contract(&self, id: ContractId) -> Result<&MilestoneEscrow> {
        self.contracts
            .get(&id)
            .ok_or(EscrowError::UnknownContract(id))
    }

    /// All accounts with their balances, in address order.
    pub fn accounts(&self) -> impl Iterator<Item = (Address, Wei)> + '_ {
        self.accounts.iter().map(|(a, b)| (*a, *b))
    }

    /// All deployed contracts, in id order.
    pub fn contracts(&self) -> impl Iterator<Item = (ContractId, &MilestoneEscrow)> {
        self.contracts.iter().map(|(id, c)| (*id, c))
    }

    /// Sum of all external and escrowed balances.
    ///
    /// Deposits and payouts only move value between the two sides, so this
    /// total is constant across any sequence of operations.
    pub fn total_value(&self) -> Result<Wei> {
        let mut total: Wei = 0;
        for balance in self.accounts.values() {
            total = add_wei(total, *balance)?;
        }
        for contract in self.contracts.values() {
            total = add_wei(total, contract.balance())?;
        }
        Ok(total)
    }
}
