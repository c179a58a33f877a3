//! Stable identifiers for ledger/escrow invariants (used for testing and
//! counterexamples).

use std::collections::BTreeMap;

use crate::ledger::InMemoryLedger;
use crate::{ContractId, Result, Wei};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvariantId {
    /// An approved milestone flag reverted to unapproved.
    ApprovalMonotone,

    /// Total value across accounts and contracts changed.
    ValueConserved,

    /// An operation returned `Err` but mutated state anyway.
    NoMutationOnError,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvariantViolation {
    pub id: InvariantId,
    pub details: String,
}

impl InvariantViolation {
    pub fn new(id: InvariantId, details: impl Into<String>) -> Self {
        Self {
            id,
            details: details.into(),
        }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.id, self.details)
    }
}

impl std::error::Error for InvariantViolation {}

/// Cheap snapshot of the invariant-relevant parts of a ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerObservation {
    total_value: Wei,
    completed: BTreeMap<ContractId, bool>,
}

impl LedgerObservation {
    pub fn capture(ledger: &InMemoryLedger) -> Result<Self> {
        Ok(Self {
            total_value: ledger.total_value()?,
            completed: ledger
                .contracts()
                .map(|(id, c)| (id, c.milestone_completed()))
                .collect(),
        })
    }

    pub fn total_value(&self) -> Wei {
        self.total_value
    }
}

/// Check the step invariants between two observations of the same ledger.
///
/// Deployments may add contracts between observations; for contracts
/// present in both, the approval flag must be monotone, and the total value
/// must be identical (no operation mints or burns).
pub fn check_step(
    before: &LedgerObservation,
    after: &LedgerObservation,
) -> std::result::Result<(), InvariantViolation> {
    if before.total_value != after.total_value {
        return Err(InvariantViolation::new(
            InvariantId::ValueConserved,
            format!(
                "total value changed: {} -> {}",
                before.total_value, after.total_value
            ),
        ));
    }

    for (id, was_completed) in &before.completed {
        if *was_completed && after.completed.get(id) == Some(&false) {
            return Err(InvariantViolation::new(
                InvariantId::ApprovalMonotone,
                format!("{id} flag reverted to unapproved"),
            ));
        }
    }

    Ok(())
}

/// Check that a failed operation left the ledger untouched.
pub fn check_no_mutation_on_error(
    before: &InMemoryLedger,
    after: &InMemoryLedger,
) -> std::result::Result<(), InvariantViolation> {
    if before != after {
        return Err(InvariantViolation::new(
            InvariantId::NoMutationOnError,
            "ledger state changed across a failed operation",
        ));
    }
    Ok(())
}
