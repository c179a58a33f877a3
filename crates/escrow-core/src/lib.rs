use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;
pub mod contract;
pub mod hello;
pub mod invariants;
pub mod ledger;
pub mod math;

pub use config::SimConfig;
pub use contract::{MilestoneEscrow, Payout};
pub use hello::HelloWorld;
pub use ledger::InMemoryLedger;

/// Native-currency amount in smallest units (wei).
///
/// Balances are u128 with fail-closed checked arithmetic (see `math`);
/// 2^128 wei is far beyond any realistic deposit sequence, so behavior
/// matches an unbounded non-negative integer everywhere it matters.
pub type Wei = u128;

/// Smallest units per whole ether.
pub const WEI_PER_ETHER: Wei = 1_000_000_000_000_000_000;

/// 20-byte account identity used for owners, contractors and depositors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Handle for a contract instance deployed on a ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContractId(pub u64);

impl std::fmt::Display for ContractId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "contract#{}", self.0)
    }
}

/// The two fixed roles an escrow instance knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Owner,
    Contractor,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Contractor => write!(f, "contractor"),
        }
    }
}

/// Unified error type for escrow-core operations.
///
/// The first four variants are the contract's own failures and carry the
/// exact revert messages the contract exposes to callers; the rest belong
/// to the hosting environment (ledger, config).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EscrowError {
    #[error("Only the owner can call this function.")]
    NotOwner,

    #[error("Only the contractor can call this function.")]
    NotContractor,

    #[error("Milestone has not been approved yet.")]
    MilestoneNotApproved,

    #[error("No funds available for withdrawal.")]
    NoFunds,

    // Environment errors
    #[error("Unknown account: {0}")]
    UnknownAccount(Address),

    #[error("Unknown contract: {0}")]
    UnknownContract(ContractId),

    #[error("Insufficient funds: account {account} holds {held} wei, needs {needed}")]
    InsufficientFunds {
        account: Address,
        held: Wei,
        needed: Wei,
    },

    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Coarse classification of failures, matching the contract's two revert
/// lanes plus everything the surrounding environment can raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller identity does not match the required role.
    Unauthorized,
    /// A required state condition does not hold.
    PreconditionFailed,
    /// Raised by the ledger/config layer, not the contract itself.
    Environment,
}

impl EscrowError {
    /// The role the caller would have needed, for authorization failures.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            EscrowError::NotOwner => Some(Role::Owner),
            EscrowError::NotContractor => Some(Role::Contractor),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EscrowError::NotOwner | EscrowError::NotContractor => ErrorKind::Unauthorized,
            EscrowError::MilestoneNotApproved | EscrowError::NoFunds => {
                ErrorKind::PreconditionFailed
            }
            _ => ErrorKind::Environment,
        }
    }
}

pub type Result<T> = std::result::Result<T, EscrowError>;
