//! Milestone escrow state machine.
//!
//! A single instance holds two fixed identities (owner, contractor), one
//! monotonic approval flag and the escrowed balance. The caller identity is
//! passed explicitly to every state-mutating operation, so the machine is
//! directly unit-testable without a ledger harness; a hosting ledger is only
//! needed to move value into and out of the instance.
//!
//! State diagram: `Unapproved` (initial) -> `Approved` (terminal for the
//! flag; re-approving is a no-op, not an error).

use serde::{Deserialize, Serialize};
use crate::math::add_wei;
use crate::{Address, EscrowError, Result, Wei};

/// Value leaving an escrow instance toward its contractor.
///
/// A `Payout` is only ever produced *after* the contract balance has been
/// zeroed, so a reentrant `cash_in` attempt during its application sees an
/// empty contract and fails the balance precondition. The hosting
/// environment applies it to the recipient's external balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use = "a payout moves no value until the environment credits it"]
pub struct Payout {
    pub recipient: Address,
    pub amount: Wei,
}

/// Two-party escrow gated by a single milestone approval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneEscrow {
    owner: Address,
    contractor: Address,
    milestone_completed: bool,
    balance: Wei,
}

impl MilestoneEscrow {
    /// Construct a new escrow instance.
    ///
    /// Postconditions:
    /// - `owner() == deployer`, `contractor() == contractor`
    /// - `milestone_completed() == false`, `balance() == 0`
    ///
    /// Owner and contractor are not required to be distinct; a
    /// self-escrow holds both roles and both gates pass for it.
    pub fn new(deployer: Address, contractor: Address) -> Self {
        Self {
            owner: deployer,
            contractor,
            milestone_completed: false,
            balance: 0,
        }
    }

    /// Accept an inbound value transfer.
    ///
    /// Callable by any identity, with any amount; a zero-amount deposit is a
    /// successful no-op. Fails only on balance overflow (fail-closed), in
    /// which case the instance is unchanged.
    pub fn deposit(&mut self, amount: Wei) -> Result<()> {
        self.balance = add_wei(self.balance, amount)?;
        Ok(())
    }

    /// Latch the milestone flag to `true`.
    ///
    /// Preconditions:
    /// - `caller == owner()` (else `NotOwner`, no mutation)
    ///
    /// Idempotent: approving an already-approved milestone succeeds and
    /// re-asserts the flag. Nothing ever clears it.
    pub fn approve_milestone(&mut self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(EscrowError::NotOwner);
        }
        self.milestone_completed = true;
        Ok(())
    }

    /// Drain the full balance to the contractor.
    ///
    /// Preconditions, checked in order:
    /// 1. `caller == contractor()` (else `NotContractor`)
    /// 2. `milestone_completed()` (else `MilestoneNotApproved`)
    /// 3. `balance() > 0` (else `NoFunds`)
    ///
    /// Postconditions:
    /// - `balance() == 0`
    /// - returned payout carries the full pre-call balance
    ///
    /// The balance is zeroed before the payout value exists; this ordering
    /// is the reentrancy defense and is load-bearing.
    pub fn cash_in(&mut self, caller: Address) -> Result<Payout> {
        if caller != self.contractor {
            return Err(EscrowError::NotContractor);
        }
        if !self.milestone_completed {
            return Err(EscrowError::MilestoneNotApproved);
        }
        if self.balance == 0 {
            return Err(EscrowError::NoFunds);
        }

        let amount = self.balance;
        self.balance = 0;
        Ok(Payout {
            recipient: self.contractor,
            amount,
        })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn contractor(&self) -> Address {
        self.contractor
    }

    pub fn milestone_completed(&self) -> bool {
        self.milestone_completed
    }

    pub fn balance(&self) -> Wei {
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, WEI_PER_ETHER};

    fn addr(b: u8) -> Address {
        Address::new([b; 20])
    }

    fn ether_milli(m: u128) -> Wei {
        m * (WEI_PER_ETHER / 1000)
    }

    fn deployed() -> MilestoneEscrow {
        // client = 1, contractor = 2, third party = 3 in every test
        MilestoneEscrow::new(addr(1), addr(2))
    }

    #[test]
    fn deployment_sets_initial_state() {
        let escrow = deployed();
        assert_eq!(escrow.owner(), addr(1));
        assert_eq!(escrow.contractor(), addr(2));
        assert!(!escrow.milestone_completed());
        assert_eq!(escrow.balance(), 0);
    }

    #[test]
    fn deposits_accumulate() {
        let mut escrow = deployed();
        escrow.deposit(ether_milli(1000)).expect("deposit 1.0");
        escrow.deposit(ether_milli(500)).expect("deposit 0.5");
        escrow.deposit(ether_milli(300)).expect("deposit 0.3");
        assert_eq!(escrow.balance(), ether_milli(1800));
    }

    #[test]
    fn zero_value_deposit_is_a_successful_noop() {
        let mut escrow = deployed();
        escrow.deposit(0).expect("zero deposit");
        assert_eq!(escrow.balance(), 0);
    }

    #[test]
    fn deposit_overflow_fails_closed() {
        let mut escrow = deployed();
        escrow.deposit(Wei::MAX).expect("fill");
        let err = escrow.deposit(1).unwrap_err();
        assert!(matches!(err, EscrowError::AmountOverflow(_)));
        assert_eq!(escrow.balance(), Wei::MAX);
    }

    #[test]
    fn owner_can_approve() {
        let mut escrow = deployed();
        escrow.approve_milestone(addr(1)).expect("approve");
        assert!(escrow.milestone_completed());
    }

    #[test]
    fn non_owner_cannot_approve() {
        let mut escrow = deployed();
        for caller in [addr(2), addr(3)] {
            let err = escrow.approve_milestone(caller).unwrap_err();
            assert_eq!(err, EscrowError::NotOwner);
            assert_eq!(err.kind(), ErrorKind::Unauthorized);
            assert_eq!(
                err.to_string(),
                "Only the owner can call this function."
            );
        }
        assert!(!escrow.milestone_completed());
    }

    #[test]
    fn approval_is_idempotent() {
        let mut escrow = deployed();
        escrow.approve_milestone(addr(1)).expect("first approve");
        escrow.approve_milestone(addr(1)).expect("second approve");
        assert!(escrow.milestone_completed());
    }

    #[test]
    fn approval_cannot_be_cleared() {
        let mut escrow = deployed();
        escrow.approve_milestone(addr(1)).expect("approve");

        // There is no un-approve operation; the only remaining mutations
        // must leave the flag latched.
        escrow.deposit(ether_milli(100)).expect("deposit");
        let _ = escrow.cash_in(addr(2)).expect("cash in");
        assert!(escrow.milestone_completed());
    }

    #[test]
    fn cash_in_drains_full_balance() {
        let mut escrow = deployed();
        escrow.deposit(2 * WEI_PER_ETHER).expect("fund");
        escrow.approve_milestone(addr(1)).expect("approve");

        let payout = escrow.cash_in(addr(2)).expect("cash in");
        assert_eq!(payout.recipient, addr(2));
        assert_eq!(payout.amount, 2 * WEI_PER_ETHER);
        assert_eq!(escrow.balance(), 0);
    }

    #[test]
    fn cash_in_by_non_contractor_fails() {
        let mut escrow = deployed();
        escrow.deposit(WEI_PER_ETHER).expect("fund");
        escrow.approve_milestone(addr(1)).expect("approve");

        // Neither the owner nor a third party may withdraw.
        for caller in [addr(1), addr(3)] {
            let err = escrow.cash_in(caller).unwrap_err();
            assert_eq!(err, EscrowError::NotContractor);
            assert_eq!(
                err.to_string(),
                "Only the contractor can call this function."
            );
        }
        assert_eq!(escrow.balance(), WEI_PER_ETHER);
    }

    #[test]
    fn cash_in_without_approval_fails_regardless_of_balance() {
        let mut escrow = deployed();
        escrow.deposit(5 * WEI_PER_ETHER).expect("fund");

        let err = escrow.cash_in(addr(2)).unwrap_err();
        assert_eq!(err, EscrowError::MilestoneNotApproved);
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(err.to_string(), "Milestone has not been approved yet.");
        assert_eq!(escrow.balance(), 5 * WEI_PER_ETHER);
    }

    #[test]
    fn cash_in_with_no_funds_fails() {
        let mut escrow = deployed();
        escrow.approve_milestone(addr(1)).expect("approve");

        let err = escrow.cash_in(addr(2)).unwrap_err();
        assert_eq!(err, EscrowError::NoFunds);
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(err.to_string(), "No funds available for withdrawal.");
    }

    #[test]
    fn second_cash_in_finds_nothing() {
        let mut escrow = deployed();
        escrow.deposit(WEI_PER_ETHER).expect("fund");
        escrow.approve_milestone(addr(1)).expect("approve");
        let _ = escrow.cash_in(addr(2)).expect("first cash in");

        // Models a reentrant retry: the balance was zeroed before the first
        // payout existed, so a second attempt hits the funds precondition.
        let err = escrow.cash_in(addr(2)).unwrap_err();
        assert_eq!(err, EscrowError::NoFunds);
    }

    #[test]
    fn precondition_order_is_authorization_first() {
        // Unfunded, unapproved contract: a third party must see the
        // authorization error, not a precondition error.
        let mut escrow = deployed();
        let err = escrow.cash_in(addr(3)).unwrap_err();
        assert_eq!(err, EscrowError::NotContractor);
    }

    #[test]
    fn failed_operations_leave_state_unchanged() {
        let mut escrow = deployed();
        escrow.deposit(ether_milli(700)).expect("fund");
        let snapshot = escrow.clone();

        let _ = escrow.approve_milestone(addr(3)).unwrap_err();
        assert_eq!(escrow, snapshot);

        let _ = escrow.cash_in(addr(2)).unwrap_err();
        assert_eq!(escrow, snapshot);

        let _ = escrow.cash_in(addr(1)).unwrap_err();
        assert_eq!(escrow, snapshot);
    }

    #[test]
    fn self_escrow_holds_both_roles() {
        // owner == contractor is not rejected at construction.
        let mut escrow = MilestoneEscrow::new(addr(7), addr(7));
        escrow.deposit(WEI_PER_ETHER).expect("fund");
        escrow.approve_milestone(addr(7)).expect("approve");
        let payout = escrow.cash_in(addr(7)).expect("cash in");
        assert_eq!(payout.amount, WEI_PER_ETHER);
    }
}
